use super::*;
use crate::foundation::math::Point4;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;

fn fragment(x: f64, y: f64, depth: f64) -> Fragment {
    Fragment {
        position: Point4::new(x, y, depth, 1.0),
        ..Fragment::default()
    }
}

#[test]
fn resolutions_have_fixed_dimensions() {
    assert_eq!(Resolution::Vga.dimensions(), (640, 480));
    assert_eq!(Resolution::Svga.dimensions(), (800, 600));
    assert_eq!(Resolution::Uhd8k.dimensions(), (7680, 4320));
    assert_eq!("SXGA".parse::<Resolution>().unwrap(), Resolution::Sxga);
    assert!("4k".parse::<Resolution>().is_err());
}

#[test]
fn planes_share_one_element_count() {
    let fb = Framebuffer::new(Resolution::Vga);
    let n = 640 * 480;
    assert_eq!(fb.len(), n);
    assert_eq!(fb.pixel_buffer().len(), n);
    assert_eq!(fb.depth_buffer().len(), n);
    assert_eq!(fb.stencil_buffer().len(), n);
    assert_eq!(fb.accumulation_buffer().len(), n);
}

#[test]
fn offset_is_defined_only_inside_the_buffer() {
    let fb = Framebuffer::new(Resolution::Vga);
    assert_eq!(fb.offset(0, 0), Some(0));
    assert_eq!(fb.offset(639, 479), Some(640 * 480 - 1));
    assert_eq!(fb.offset(2, 1), Some(642));
    for (x, y) in [(-1, 0), (0, -1), (640, 0), (0, 480), (640, 480)] {
        assert_eq!(fb.offset(x, y), None);
    }
}

#[test]
fn out_of_bounds_writes_are_ignored() {
    let fb = Framebuffer::new(Resolution::Vga);
    let before = fb.pixel_buffer();
    for (x, y) in [(-1, 0), (0, -1), (640, 10), (10, 480), (640, 480), (-1, -1)] {
        assert!(!fb.plot_pixel(x, y, 0.0, 0xFFFF_FFFF));
        assert!(!fb.plot(&fragment(x as f64, y as f64, 0.0), |_| 0xFFFF_FFFF));
        fb.discard(x, y);
    }
    assert_eq!(fb.pixel_buffer(), before);
    assert!(fb.stencil_buffer().iter().all(|&s| s == 0));
}

#[test]
fn passing_fragment_updates_pixel_and_depth() {
    let fb = Framebuffer::new(Resolution::Vga);
    assert!(fb.plot(&fragment(3.0, 4.0, 0.25), |_| 0xFF11_2233));
    assert_eq!(fb.pixel_at(3, 4), Some(0xFF11_2233));
    assert_eq!(fb.depth_at(3, 4), Some(0.25));
}

#[test]
fn failing_depth_test_leaves_buffers_unchanged() {
    let fb = Framebuffer::new(Resolution::Vga);
    assert!(fb.plot_pixel(5, 5, 0.3, 0xFF00_00FF));
    assert!(!fb.plot_pixel(5, 5, 0.6, 0xFFFF_0000));
    assert!(!fb.plot_pixel(5, 5, 0.3, 0xFFFF_0000));
    assert_eq!(fb.pixel_at(5, 5), Some(0xFF00_00FF));
    assert_eq!(fb.depth_at(5, 5), Some(0.3));
}

#[test]
fn fragment_op_is_not_run_for_rejected_fragments() {
    let fb = Framebuffer::new(Resolution::Vga);
    let mut calls = 0;
    fb.plot(&fragment(1.0, 1.0, 2.0), |_| {
        calls += 1;
        0
    });
    let mut discarded = fragment(1.0, 1.0, 0.1);
    discarded.discarded = true;
    fb.plot(&discarded, |_| {
        calls += 1;
        0
    });
    assert_eq!(calls, 0);
}

#[test]
fn configurable_depth_function() {
    let mut fb = Framebuffer::new(Resolution::Vga);
    fb.set_depth_clear_value(0.0);
    fb.set_depth_function(DepthFunction::Greater);
    fb.clear();
    assert!(fb.plot_pixel(0, 0, 0.5, 1));
    assert!(!fb.plot_pixel(0, 0, 0.4, 2));
    assert!(fb.plot_pixel(0, 0, 0.9, 3));
    assert_eq!(fb.pixel_at(0, 0), Some(3));

    fb.set_depth_function(DepthFunction::Never);
    assert!(!fb.plot_pixel(1, 1, -10.0, 4));
    fb.set_depth_function(DepthFunction::Always);
    assert!(fb.plot_pixel(1, 1, 10.0, 5));
}

#[test]
fn discarded_offsets_reject_any_depth() {
    let fb = Framebuffer::new(Resolution::Vga);
    fb.discard(7, 7);
    assert_eq!(fb.stencil_at(7, 7), Some(STENCIL_DISCARDED));
    assert!(!fb.plot_pixel(7, 7, -1.0, 0xFFFF_FFFF));
    assert_eq!(fb.pixel_at(7, 7), Some(0));
}

#[test]
fn read_only_buffer_rejects_writes() {
    let fb = Framebuffer::new(Resolution::Vga);
    fb.set_writable(false);
    assert!(!fb.plot_pixel(0, 0, 0.0, 1));
    fb.set_writable(true);
    assert!(fb.plot_pixel(0, 0, 0.0, 1));
}

#[test]
fn discard_during_shading_drops_the_write() {
    let fb = Framebuffer::new(Resolution::Vga);
    let written = fb.plot(&fragment(3.0, 3.0, 0.5), |_| {
        fb.discard(3, 3);
        0xFFFF_FFFF
    });
    assert!(!written);
    assert_eq!(fb.pixel_at(3, 3), Some(0));
}

#[test]
fn read_only_switch_during_shading_drops_the_write() {
    let fb = Framebuffer::new(Resolution::Vga);
    let written = fb.plot(&fragment(3.0, 3.0, 0.5), |_| {
        fb.set_writable(false);
        0xFFFF_FFFF
    });
    assert!(!written);
    fb.set_writable(true);
    assert_eq!(fb.pixel_at(3, 3), Some(0));
    assert!(fb.plot(&fragment(4.0, 3.0, 0.5), |_| 0xFFFF_FFFF));
}

#[test]
fn clear_restores_every_plane() {
    let mut fb = Framebuffer::new(Resolution::Vga);
    fb.set_pixel_clear_value(0xFF10_2030);
    fb.set_depth_clear_value(0.75);
    fb.set_stencil_clear_value(3);
    fb.set_accumulation_clear_value(9);
    fb.plot_pixel(1, 2, 0.1, 0xFFFF_FFFF);
    fb.discard(4, 4);
    fb.accumulate(5, 5, 0x0101_0101);
    fb.clear();

    assert!(fb.pixel_buffer().iter().all(|&p| p == 0xFF10_2030));
    assert!(fb.depth_buffer().iter().all(|&d| d == 0.75));
    assert!(fb.stencil_buffer().iter().all(|&s| s == 3));
    assert!(fb.accumulation_buffer().iter().all(|&a| a == 9));
}

#[test]
fn resize_to_same_resolution_keeps_contents_unless_forced() {
    let mut fb = Framebuffer::new(Resolution::Vga);
    fb.plot_pixel(10, 10, 0.2, 0xFFAB_CDEF);

    fb.resize(Resolution::Vga, false);
    assert_eq!(fb.pixel_at(10, 10), Some(0xFFAB_CDEF));

    fb.resize(Resolution::Vga, true);
    assert_eq!(fb.pixel_at(10, 10), Some(0));
    assert_eq!(fb.depth_at(10, 10), Some(1.0));
}

#[test]
fn resize_to_new_resolution_reallocates() {
    let mut fb = Framebuffer::new(Resolution::Vga);
    fb.resize(Resolution::Svga, false);
    assert_eq!((fb.width(), fb.height()), (800, 600));
    assert_eq!(fb.len(), 800 * 600);
    assert_eq!(fb.resolution(), Resolution::Svga);
    assert_eq!(fb.offset(799, 599), Some(800 * 600 - 1));
}

#[test]
fn accumulation_saturates_per_channel() {
    let fb = Framebuffer::new(Resolution::Vga);
    fb.accumulate(0, 0, 0x80F0_1020);
    fb.accumulate(0, 0, 0x8020_1020);
    assert_eq!(fb.accumulation_at(0, 0), Some(0xFFFF_2040));
}

#[test]
fn concurrent_plots_keep_the_nearest_fragment() {
    let fb = Arc::new(Framebuffer::new(Resolution::Vga));
    std::thread::scope(|s| {
        for t in 0..8u32 {
            let fb = Arc::clone(&fb);
            s.spawn(move || {
                for i in 0..2000u32 {
                    let depth = ((i * 8 + t) % 997) as f32 / 1000.0 + 0.001;
                    let pixel = depth.to_bits();
                    fb.plot_pixel(100, 100, depth, pixel);
                }
            });
        }
    });
    let depth = fb.depth_at(100, 100).unwrap();
    assert_eq!(depth, 0.001);
    // Pixel and depth were committed together.
    assert_eq!(fb.pixel_at(100, 100), Some(depth.to_bits()));
}

#[test]
fn filter_rewrites_pixels_only() {
    let fb = Framebuffer::new(Resolution::Vga);
    fb.plot_pixel(0, 0, 0.5, 0xFFFF_FFFF);
    fb.plot_pixel(1, 0, 0.5, 0xFF20_2020);
    fb.apply_filter(ImageFilter::BlackAndWhite);
    assert_eq!(fb.pixel_at(0, 0), Some(0xFFFF_FFFF));
    assert_eq!(fb.pixel_at(1, 0), Some(0xFF00_0000));
    assert_eq!(fb.depth_at(1, 0), Some(0.5));
}

#[test]
fn rgba8_readback_swizzles_argb() {
    let fb = Framebuffer::new(Resolution::Vga);
    fb.plot_pixel(0, 0, 0.0, 0x8011_2233);
    let frame = fb.to_rgba8();
    assert_eq!((frame.width, frame.height), (640, 480));
    assert_eq!(frame.data.len(), 640 * 480 * 4);
    assert_eq!(&frame.data[..4], &[0x11, 0x22, 0x33, 0x80]);
}

#[test]
fn frame_ready_is_explicit_and_counted() {
    let mut fb = Framebuffer::new(Resolution::Vga);
    let seen = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&seen);
    fb.on_frame_ready(move |ready| {
        assert_eq!((ready.width, ready.height), (640, 480));
        sink.fetch_add(1, Ordering::SeqCst);
    });

    fb.plot_pixel(0, 0, 0.0, 1);
    assert_eq!(seen.load(Ordering::SeqCst), 0);

    assert_eq!(fb.signal_frame_ready().frame, 1);
    assert_eq!(fb.signal_frame_ready().frame, 2);
    assert_eq!(seen.load(Ordering::SeqCst), 2);
    assert_eq!(fb.frames_presented(), 2);
}
