use crate::foundation::math::{Matrix4, Point3, Vector3};
use crate::render::filter::{ImageFilter, TextureFilter};
use crate::render::parameters::Light;
use crate::render::renderer::RendererType;
use crate::render::viewport::{Projection, Viewport};
use crate::scene::body::RigidBody;

/// The camera together with the render settings it is viewed through.
#[derive(Clone, Debug, PartialEq)]
pub struct Viewer {
    pub eye: Point3,
    pub target: Point3,
    pub up: Vector3,
    pub projection: Projection,
    pub viewport: Viewport,
    pub renderer: RendererType,
    pub image_filter: ImageFilter,
    pub texture_filter: TextureFilter,
    /// Light in world space.
    pub light: Light,
}

impl Default for Viewer {
    fn default() -> Self {
        Self {
            eye: Point3::new(0.0, 0.0, 3.0),
            target: Point3::ZERO,
            up: Vector3::UNIT_Y,
            projection: Projection::default(),
            viewport: Viewport::default(),
            renderer: RendererType::default(),
            image_filter: ImageFilter::default(),
            texture_filter: TextureFilter::default(),
            light: Light::default(),
        }
    }
}

impl Viewer {
    pub fn view_matrix(&self) -> Matrix4 {
        Matrix4::look_at(self.eye, self.target, self.up)
    }

    /// Aspect ratio of the viewport on a `width` x `height` target.
    pub fn aspect(&self, width: u32, height: u32) -> f64 {
        let w = self.viewport.width * f64::from(width);
        let h = self.viewport.height * f64::from(height);
        if h > 0.0 { w / h } else { 1.0 }
    }

    pub fn projection_matrix(&self, width: u32, height: u32) -> Matrix4 {
        self.projection.matrix(self.aspect(width, height))
    }
}

/// Everything drawn in one frame.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub viewer: Viewer,
    pub bodies: Vec<RigidBody>,
}

impl Scene {
    pub fn new(viewer: Viewer) -> Self {
        Self {
            viewer,
            bodies: Vec::new(),
        }
    }

    pub fn add(&mut self, body: RigidBody) {
        self.bodies.push(body);
    }

    /// Number of faces over all bodies.
    pub fn face_count(&self) -> usize {
        self.bodies.iter().map(|b| b.model.face_count()).sum()
    }
}
