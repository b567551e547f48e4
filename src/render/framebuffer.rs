//! Multi-plane frame storage with atomic fragment test-and-set.
//!
//! Pixel and depth for one offset live in a single packed `AtomicU64`
//! (`depth f32 bits << 32 | ARGB pixel`), so a depth comparison and the write that follows it
//! form one indivisible step even when several render tasks race over the same pixel. Stencil and
//! accumulation values live in their own atomic planes.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, AtomicU64, Ordering};

use rayon::prelude::*;

use crate::render::filter::ImageFilter;
use crate::render::fragment::Fragment;

/// Stencil value marking an offset as discarded; fragment tests at that offset always fail.
pub const STENCIL_DISCARDED: u8 = 0xFF;

/// Available framebuffer resolutions.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// 640 x 480
    Vga,
    /// 800 x 600
    #[default]
    Svga,
    /// 1024 x 768
    Xga,
    /// 1280 x 1024
    Sxga,
    /// 1920 x 1080
    Fhd,
    /// 2560 x 2048
    Qsxga,
    /// 7680 x 4320
    Uhd8k,
}

impl Resolution {
    pub const ALL: [Self; 7] = [
        Self::Vga,
        Self::Svga,
        Self::Xga,
        Self::Sxga,
        Self::Fhd,
        Self::Qsxga,
        Self::Uhd8k,
    ];

    pub fn dimensions(self) -> (u32, u32) {
        match self {
            Self::Vga => (640, 480),
            Self::Svga => (800, 600),
            Self::Xga => (1024, 768),
            Self::Sxga => (1280, 1024),
            Self::Fhd => (1920, 1080),
            Self::Qsxga => (2560, 2048),
            Self::Uhd8k => (7680, 4320),
        }
    }

    pub fn width(self) -> u32 {
        self.dimensions().0
    }

    pub fn height(self) -> u32 {
        self.dimensions().1
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Vga => "vga",
            Self::Svga => "svga",
            Self::Xga => "xga",
            Self::Sxga => "sxga",
            Self::Fhd => "fhd",
            Self::Qsxga => "qsxga",
            Self::Uhd8k => "uhd8k",
        }
    }
}

crate::render::filter::named_enum_str!(Resolution, "resolution");

/// Depth comparison applied by the fragment test: `incoming <op> stored` passes.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DepthFunction {
    #[default]
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    Always,
    Never,
}

impl DepthFunction {
    pub fn passes(self, incoming: f32, stored: f32) -> bool {
        match self {
            Self::Less => incoming < stored,
            Self::LessOrEqual => incoming <= stored,
            Self::Greater => incoming > stored,
            Self::GreaterOrEqual => incoming >= stored,
            Self::Always => true,
            Self::Never => false,
        }
    }
}

/// Payload of the frame-ready notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameReady {
    /// Number of frames presented so far, starting at 1.
    pub frame: u64,
    pub width: u32,
    pub height: u32,
}

type FrameReadyCallback = Box<dyn Fn(FrameReady) + Send + Sync>;

/// A read-back of the pixel plane as RGBA8 bytes.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major, straight alpha.
    pub data: Vec<u8>,
}

pub struct Framebuffer {
    resolution: Resolution,
    width: u32,
    height: u32,
    color_depth: Vec<AtomicU64>,
    stencil: Vec<AtomicU8>,
    accumulation: Vec<AtomicU32>,
    pixel_clear_value: u32,
    depth_clear_value: f32,
    stencil_clear_value: u8,
    accumulation_clear_value: u32,
    depth_function: DepthFunction,
    writable: AtomicBool,
    frames_presented: AtomicU64,
    frame_ready: Option<FrameReadyCallback>,
}

fn pack(depth: f32, pixel: u32) -> u64 {
    (u64::from(depth.to_bits()) << 32) | u64::from(pixel)
}

fn unpack_depth(word: u64) -> f32 {
    f32::from_bits((word >> 32) as u32)
}

fn unpack_pixel(word: u64) -> u32 {
    word as u32
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new(Resolution::default())
    }
}

impl Framebuffer {
    pub fn new(resolution: Resolution) -> Self {
        let mut fb = Self {
            resolution,
            width: 0,
            height: 0,
            color_depth: Vec::new(),
            stencil: Vec::new(),
            accumulation: Vec::new(),
            pixel_clear_value: 0,
            depth_clear_value: 1.0,
            stencil_clear_value: 0,
            accumulation_clear_value: 0,
            depth_function: DepthFunction::default(),
            writable: AtomicBool::new(true),
            frames_presented: AtomicU64::new(0),
            frame_ready: None,
        };
        fb.resize(resolution, true);
        fb
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.color_depth.len()
    }

    pub fn is_empty(&self) -> bool {
        self.color_depth.is_empty()
    }

    /// Linear offset of `(x, y)`, or `None` outside the buffer.
    pub fn offset(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn pixel_clear_value(&self) -> u32 {
        self.pixel_clear_value
    }

    pub fn set_pixel_clear_value(&mut self, value: u32) {
        self.pixel_clear_value = value;
    }

    pub fn depth_clear_value(&self) -> f32 {
        self.depth_clear_value
    }

    pub fn set_depth_clear_value(&mut self, value: f32) {
        self.depth_clear_value = value;
    }

    pub fn stencil_clear_value(&self) -> u8 {
        self.stencil_clear_value
    }

    pub fn set_stencil_clear_value(&mut self, value: u8) {
        self.stencil_clear_value = value;
    }

    pub fn accumulation_clear_value(&self) -> u32 {
        self.accumulation_clear_value
    }

    pub fn set_accumulation_clear_value(&mut self, value: u32) {
        self.accumulation_clear_value = value;
    }

    pub fn depth_function(&self) -> DepthFunction {
        self.depth_function
    }

    pub fn set_depth_function(&mut self, function: DepthFunction) {
        self.depth_function = function;
    }

    pub fn is_writable(&self) -> bool {
        self.writable.load(Ordering::Acquire)
    }

    /// Make the framebuffer writable or read-only. Writes against a read-only buffer are dropped.
    pub fn set_writable(&self, writable: bool) {
        self.writable.store(writable, Ordering::Release);
    }

    /// Reallocate every plane for `resolution`.
    ///
    /// A no-op when the resolution is unchanged, unless `force` is set. New planes hold the clear
    /// values.
    pub fn resize(&mut self, resolution: Resolution, force: bool) {
        if !force && resolution == self.resolution && !self.color_depth.is_empty() {
            return;
        }
        let (width, height) = resolution.dimensions();
        let len = width as usize * height as usize;
        let word = pack(self.depth_clear_value, self.pixel_clear_value);

        self.resolution = resolution;
        self.width = width;
        self.height = height;
        self.color_depth = (0..len).map(|_| AtomicU64::new(word)).collect();
        self.stencil = (0..len)
            .map(|_| AtomicU8::new(self.stencil_clear_value))
            .collect();
        self.accumulation = (0..len)
            .map(|_| AtomicU32::new(self.accumulation_clear_value))
            .collect();
        tracing::debug!(width, height, "framebuffer resized");
    }

    /// Reset all four planes to their clear values.
    ///
    /// Must complete before any render task starts writing the next frame.
    pub fn clear(&self) {
        let word = pack(self.depth_clear_value, self.pixel_clear_value);
        let stencil = self.stencil_clear_value;
        let accumulation = self.accumulation_clear_value;
        self.color_depth
            .par_iter()
            .for_each(|c| c.store(word, Ordering::Relaxed));
        self.stencil
            .par_iter()
            .for_each(|c| c.store(stencil, Ordering::Relaxed));
        self.accumulation
            .par_iter()
            .for_each(|c| c.store(accumulation, Ordering::Relaxed));
        std::sync::atomic::fence(Ordering::Release);
    }

    /// Early fragment test: bounds, writability, stencil and a depth snapshot.
    ///
    /// Returns the fragment's offset when it may be written. The depth comparison is repeated
    /// atomically when the write is committed.
    fn fragment_passes(&self, x: i64, y: i64, depth: f32) -> Option<usize> {
        if !self.is_writable() || depth.is_nan() {
            return None;
        }
        let offset = self.offset(x, y)?;
        if self.stencil[offset].load(Ordering::Acquire) == STENCIL_DISCARDED {
            return None;
        }
        let stored = unpack_depth(self.color_depth[offset].load(Ordering::Acquire));
        self.depth_function
            .passes(depth, stored)
            .then_some(offset)
    }

    /// Store `pixel` and `depth` if the write is still allowed.
    ///
    /// Every attempt re-reads the writable flag, the stencil and the stored depth, so a discard or
    /// `set_writable(false)` that lands while the fragment is being shaded drops the write. One that
    /// lands after the exchange succeeds is ordered after it.
    fn commit(&self, offset: usize, depth: f32, pixel: u32) -> bool {
        let cell = &self.color_depth[offset];
        let next = pack(depth, pixel);
        let mut current = cell.load(Ordering::Acquire);
        loop {
            if !self.is_writable()
                || self.stencil[offset].load(Ordering::Acquire) == STENCIL_DISCARDED
                || !self.depth_function.passes(depth, unpack_depth(current))
            {
                return false;
            }
            match cell.compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    /// Write a fragment, converting it to a pixel value with `fop`.
    ///
    /// Returns `true` when the fragment passed every test and its pixel and depth were stored.
    /// Discarded fragments and out-of-range coordinates are ignored.
    pub fn plot<F>(&self, fragment: &Fragment, fop: F) -> bool
    where
        F: FnOnce(&Fragment) -> u32,
    {
        if fragment.discarded {
            return false;
        }
        let depth = fragment.depth();
        let Some(offset) = self.fragment_passes(fragment.x(), fragment.y(), depth) else {
            return false;
        };
        let pixel = fop(fragment);
        self.commit(offset, depth, pixel)
    }

    /// Write a pixel and its depth at `(x, y)` without shading, under the same tests as [`plot`].
    ///
    /// [`plot`]: Framebuffer::plot
    pub fn plot_pixel(&self, x: i64, y: i64, depth: f32, pixel: u32) -> bool {
        match self.fragment_passes(x, y, depth) {
            Some(offset) => self.commit(offset, depth, pixel),
            None => false,
        }
    }

    /// Mark `(x, y)` as discarded so later fragment tests there fail regardless of depth.
    pub fn discard(&self, x: i64, y: i64) {
        if let Some(offset) = self.offset(x, y) {
            self.stencil[offset].store(STENCIL_DISCARDED, Ordering::Release);
        }
    }

    /// Add `pixel` into the accumulation plane, saturating per channel.
    pub fn accumulate(&self, x: i64, y: i64, pixel: u32) {
        let Some(offset) = self.offset(x, y) else {
            return;
        };
        let _ = self.accumulation[offset].fetch_update(Ordering::AcqRel, Ordering::Acquire, |a| {
            let mut out = 0u32;
            for shift in [0, 8, 16, 24] {
                let sum = ((a >> shift) & 0xFF) + ((pixel >> shift) & 0xFF);
                out |= sum.min(0xFF) << shift;
            }
            Some(out)
        });
    }

    pub fn pixel_at(&self, x: i64, y: i64) -> Option<u32> {
        self.offset(x, y)
            .map(|o| unpack_pixel(self.color_depth[o].load(Ordering::Acquire)))
    }

    pub fn depth_at(&self, x: i64, y: i64) -> Option<f32> {
        self.offset(x, y)
            .map(|o| unpack_depth(self.color_depth[o].load(Ordering::Acquire)))
    }

    pub fn stencil_at(&self, x: i64, y: i64) -> Option<u8> {
        self.offset(x, y)
            .map(|o| self.stencil[o].load(Ordering::Acquire))
    }

    pub fn accumulation_at(&self, x: i64, y: i64) -> Option<u32> {
        self.offset(x, y)
            .map(|o| self.accumulation[o].load(Ordering::Acquire))
    }

    /// Copy of the pixel plane in `y * width + x` order.
    pub fn pixel_buffer(&self) -> Vec<u32> {
        self.color_depth
            .iter()
            .map(|c| unpack_pixel(c.load(Ordering::Acquire)))
            .collect()
    }

    pub fn depth_buffer(&self) -> Vec<f32> {
        self.color_depth
            .iter()
            .map(|c| unpack_depth(c.load(Ordering::Acquire)))
            .collect()
    }

    pub fn stencil_buffer(&self) -> Vec<u8> {
        self.stencil
            .iter()
            .map(|c| c.load(Ordering::Acquire))
            .collect()
    }

    pub fn accumulation_buffer(&self) -> Vec<u32> {
        self.accumulation
            .iter()
            .map(|c| c.load(Ordering::Acquire))
            .collect()
    }

    /// Rewrite every pixel through `filter`, leaving depth untouched.
    pub fn apply_filter(&self, filter: ImageFilter) {
        if filter == ImageFilter::None {
            return;
        }
        self.color_depth.par_iter().for_each(|c| {
            let _ = c.fetch_update(Ordering::AcqRel, Ordering::Acquire, |word| {
                Some(pack(unpack_depth(word), filter.apply(unpack_pixel(word))))
            });
        });
    }

    pub fn to_rgba8(&self) -> FrameRGBA {
        let mut data = Vec::with_capacity(self.len() * 4);
        for c in &self.color_depth {
            let px = unpack_pixel(c.load(Ordering::Acquire));
            data.extend_from_slice(&[(px >> 16) as u8, (px >> 8) as u8, px as u8, (px >> 24) as u8]);
        }
        FrameRGBA {
            width: self.width,
            height: self.height,
            data,
        }
    }

    /// Register the callback invoked by [`signal_frame_ready`](Framebuffer::signal_frame_ready).
    pub fn on_frame_ready(&mut self, callback: impl Fn(FrameReady) + Send + Sync + 'static) {
        self.frame_ready = Some(Box::new(callback));
    }

    /// Announce that the buffer holds a complete frame.
    ///
    /// Called by the render loop after every writer of the frame has finished; nothing in the
    /// write path triggers it.
    pub fn signal_frame_ready(&self) -> FrameReady {
        let frame = self.frames_presented.fetch_add(1, Ordering::AcqRel) + 1;
        let ready = FrameReady {
            frame,
            width: self.width,
            height: self.height,
        };
        if let Some(callback) = &self.frame_ready {
            callback(ready);
        }
        ready
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented.load(Ordering::Acquire)
    }
}

impl fmt::Debug for Framebuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Framebuffer")
            .field("resolution", &self.resolution)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("depth_function", &self.depth_function)
            .field("writable", &self.is_writable())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Framebuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Framebuffer({}, {}x{})", self.resolution, self.width, self.height)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/framebuffer.rs"]
mod tests;
