use std::fmt;

use crate::foundation::math::{EPSILON, Matrix4, Point4};

const DEPTH_TOLERANCE: f64 = 1e-7;

/// A normalised viewport with values that range from 0.0 (minimum) to 1.0 (maximum).
///
/// `near` and `far` are the linear mapping of the clipping planes to window depth, in the sense of
/// `glDepthRange`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub near: f64,
    pub far: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
            near: 0.0,
            far: 1.0,
        }
    }
}

impl Viewport {
    /// Map a clip-space position to window coordinates for a `width` x `height` target.
    ///
    /// The result carries pixel `x`/`y` (origin top-left, `y` down), window depth in `z` and
    /// `1/w` in `w` for perspective-correct interpolation. Returns `None` for positions on or
    /// behind the eye plane and for depths outside the near/far range (`-w <= z <= w`).
    pub fn to_window(&self, clip: Point4, width: u32, height: u32) -> Option<Point4> {
        if !(clip.w > EPSILON) {
            return None;
        }
        let inv_w = 1.0 / clip.w;
        let ndc_x = clip.x * inv_w;
        let ndc_y = clip.y * inv_w;
        let ndc_z = clip.z * inv_w;
        // Vertices produced by near/far clipping may land a rounding error outside the range.
        if !(ndc_z.abs() <= 1.0 + DEPTH_TOLERANCE) {
            return None;
        }
        let ndc_z = ndc_z.clamp(-1.0, 1.0);

        let x = (self.x + (ndc_x + 1.0) * 0.5 * self.width) * f64::from(width);
        let y = (self.y + (1.0 - ndc_y) * 0.5 * self.height) * f64::from(height);
        let z = self.near + (ndc_z + 1.0) * 0.5 * (self.far - self.near);
        Some(Point4::new(x, y, z, inv_w))
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Viewport(x={}, y={}, width={}, height={}, near={}, far={})",
            self.x, self.y, self.width, self.height, self.near, self.far
        )
    }
}

/// Supported projection methods.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionType {
    Orthographic,
    #[default]
    Perspective,
}

impl ProjectionType {
    pub const ALL: [Self; 2] = [Self::Orthographic, Self::Perspective];

    pub fn name(self) -> &'static str {
        match self {
            Self::Orthographic => "orthographic",
            Self::Perspective => "perspective",
        }
    }
}

crate::render::filter::named_enum_str!(ProjectionType, "projection");

/// Camera lens parameters.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Projection {
    pub kind: ProjectionType,
    /// Vertical field of view in radians (perspective only).
    pub fov_y: f64,
    pub near: f64,
    pub far: f64,
    /// Height of the view volume in world units (orthographic only).
    pub height: f64,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            kind: ProjectionType::Perspective,
            fov_y: 60f64.to_radians(),
            near: 0.1,
            far: 100.0,
            height: 2.0,
        }
    }
}

impl Projection {
    pub fn matrix(&self, aspect: f64) -> Matrix4 {
        let aspect = if aspect.is_finite() && aspect > 0.0 {
            aspect
        } else {
            1.0
        };
        match self.kind {
            ProjectionType::Perspective => {
                Matrix4::perspective(self.fov_y, aspect, self.near, self.far)
            }
            ProjectionType::Orthographic => {
                let half_h = self.height * 0.5;
                let half_w = half_h * aspect;
                Matrix4::orthographic(-half_w, half_w, -half_h, half_h, self.near, self.far)
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/viewport.rs"]
mod tests;
