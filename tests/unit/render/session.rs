use super::*;
use crate::assets::model::Model3D;
use crate::foundation::math::Point3;
use crate::render::filter::ImageFilter;
use crate::render::renderer::RendererType;
use crate::scene::body::RigidBody;
use crate::scene::viewer::Viewer;
use std::sync::atomic::AtomicUsize;

use crate::render::viewport::{Projection, ProjectionType};

fn opts(multi_threaded: bool) -> RenderSessionOpts {
    RenderSessionOpts {
        multi_threaded,
        threads: Some(2),
        resolution: Resolution::Vga,
    }
}

fn triangle_scene(renderer: RendererType) -> Scene {
    let model = Arc::new(Model3D::triangle(
        "tri",
        [
            Point3::new(-1.0, -1.0, 0.0),
            Point3::new(1.0, -1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ],
    ));
    let mut scene = Scene::new(Viewer {
        renderer,
        ..Viewer::default()
    });
    scene.add(RigidBody::new("tri", model));
    scene.add(RigidBody::new("empty", Arc::new(Model3D::new("empty"))));
    scene
}

#[test]
fn empty_scene_still_presents_a_frame() {
    let session = RenderSession::new(opts(true)).unwrap();
    let stats = session.render_frame(&Scene::default());
    assert_eq!(stats.frame, 1);
    assert_eq!(stats.tasks, 0);
    assert!(session.framebuffer().pixel_buffer().iter().all(|&p| p == 0));
}

#[test]
fn frame_runs_one_task_per_body_with_faces() {
    let session = RenderSession::new(opts(true)).unwrap();
    let stats = session.render_frame(&triangle_scene(RendererType::Phong));
    assert_eq!(stats.tasks, 1);
    assert_eq!(stats.faces, 1);
    assert!(stats.fragments > 0);
    assert_ne!(session.framebuffer().pixel_at(320, 240), Some(0));
    assert_eq!(session.scheduler().pending_task_count(), 0);
}

#[test]
fn frames_start_from_a_cleared_buffer() {
    let session = RenderSession::new(opts(true)).unwrap();
    session.render_frame(&triangle_scene(RendererType::Phong));
    let stats = session.render_frame(&Scene::default());
    assert_eq!(stats.frame, 2);
    assert!(session.framebuffer().pixel_buffer().iter().all(|&p| p == 0));
}

#[test]
fn image_filter_runs_after_rendering() {
    let session = RenderSession::new(opts(true)).unwrap();
    let mut scene = triangle_scene(RendererType::Random);
    scene.viewer.image_filter = ImageFilter::Grayscale;
    session.render_frame(&scene);
    let px = session.framebuffer().pixel_at(320, 240).unwrap();
    let (r, g, b) = ((px >> 16) & 0xFF, (px >> 8) & 0xFF, px & 0xFF);
    assert!(r == g && g == b);
}

#[test]
fn single_and_multi_threaded_frames_match() {
    let multi = RenderSession::new(opts(true)).unwrap();
    let single = RenderSession::new(opts(false)).unwrap();
    let scene = triangle_scene(RendererType::Normals);
    multi.render_frame(&scene);
    single.render_frame(&scene);
    assert_eq!(
        multi.framebuffer().pixel_buffer(),
        single.framebuffer().pixel_buffer()
    );
}

#[test]
fn frame_ready_callback_fires_once_per_frame() {
    let mut session = RenderSession::new(opts(true)).unwrap();
    let seen = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&seen);
    session
        .framebuffer_mut()
        .unwrap()
        .on_frame_ready(move |_| {
            sink.fetch_add(1, Ordering::SeqCst);
        });
    session.render_frame(&triangle_scene(RendererType::Wireframe));
    session.render_frame(&triangle_scene(RendererType::Wireframe));
    assert_eq!(seen.load(Ordering::SeqCst), 2);
}

#[test]
fn resolution_changes_need_exclusive_access() {
    let mut session = RenderSession::new(opts(true)).unwrap();
    session.set_resolution(Resolution::Svga, false).unwrap();
    assert_eq!(session.framebuffer().width(), 800);

    let held = Arc::clone(session.framebuffer());
    assert!(session.set_resolution(Resolution::Xga, false).is_err());
    drop(held);
    session.set_resolution(Resolution::Xga, false).unwrap();
    assert_eq!(session.framebuffer().resolution(), Resolution::Xga);
}

#[test]
fn zero_threads_is_rejected() {
    let bad = RenderSessionOpts {
        threads: Some(0),
        ..RenderSessionOpts::default()
    };
    assert!(RenderSession::new(bad).is_err());
}

fn triangle_at(name: &str, half: f64, z: f64) -> RigidBody {
    let model = Model3D::triangle(
        name,
        [
            Point3::new(-half, -half, z),
            Point3::new(half, -half, z),
            Point3::new(0.0, half, z),
        ],
    );
    RigidBody::new(name, Arc::new(model))
}

#[test]
fn geometry_behind_an_orthographic_camera_is_not_drawn() {
    let session = RenderSession::new(opts(true)).unwrap();
    let mut scene = Scene::new(Viewer {
        projection: Projection {
            kind: ProjectionType::Orthographic,
            ..Projection::default()
        },
        ..Viewer::default()
    });
    scene.add(triangle_at("behind", 1.0, 5.0));

    let stats = session.render_frame(&scene);
    assert_eq!(stats.tasks, 1);
    assert_eq!(stats.fragments, 0);
    assert!(session.framebuffer().pixel_buffer().iter().all(|&p| p == 0));
}

#[test]
fn geometry_closer_than_the_near_plane_does_not_win_the_depth_test() {
    let session = RenderSession::new(opts(true)).unwrap();
    let mut scene = Scene::new(Viewer::default());
    scene.add(triangle_at("surface", 1.0, 0.0));
    scene.add(triangle_at("too-close", 0.01, 2.95));

    session.render_frame(&scene);
    let depth = session.framebuffer().depth_at(320, 240).unwrap();
    assert!(depth > 0.9 && depth < 1.0, "centre depth {depth}");
    assert!(
        session
            .framebuffer()
            .depth_buffer()
            .iter()
            .all(|d| (0.0..=1.0).contains(d))
    );
}
