//! JSON scene descriptions.
//!
//! Every field is optional. A minimal file only lists the objects:
//!
//! ```json
//! { "objects": [ { "model": "teapot.obj" } ] }
//! ```

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::assets::model::Model3D;
use crate::assets::obj::load_obj;
use crate::foundation::core::{Color, Transform};
use crate::foundation::error::{ClockworkError, ClockworkResult};
use crate::foundation::math::{Point3, Vector3};
use crate::render::filter::{ImageFilter, TextureFilter};
use crate::render::framebuffer::{DepthFunction, Framebuffer, Resolution};
use crate::render::parameters::Light;
use crate::render::renderer::RendererType;
use crate::render::session::RenderSessionOpts;
use crate::render::viewport::{Projection, ProjectionType, Viewport};
use crate::scene::body::RigidBody;
use crate::scene::viewer::{Scene, Viewer};

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraConfig {
    pub eye: Point3,
    pub target: Point3,
    pub up: Vector3,
}

impl Default for CameraConfig {
    fn default() -> Self {
        let viewer = Viewer::default();
        Self {
            eye: viewer.eye,
            target: viewer.target,
            up: viewer.up,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThreadingConfig {
    pub multi_threaded: bool,
    pub threads: Option<usize>,
}

impl Default for ThreadingConfig {
    fn default() -> Self {
        Self {
            multi_threaded: true,
            threads: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectConfig {
    #[serde(default)]
    pub name: Option<String>,
    /// OBJ file, relative to the scene file.
    pub model: PathBuf,
    #[serde(default)]
    pub transform: Transform,
}

impl ObjectConfig {
    /// An unnamed object with the identity transform.
    pub fn for_model(model: impl Into<PathBuf>) -> Self {
        Self {
            name: None,
            model: model.into(),
            transform: Transform::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneConfig {
    pub resolution: Resolution,
    pub renderer: RendererType,
    pub image_filter: ImageFilter,
    pub texture_filter: TextureFilter,
    pub projection: Projection,
    pub viewport: Viewport,
    pub camera: CameraConfig,
    pub light: Light,
    pub clear_color: Color,
    pub depth_function: DepthFunction,
    pub threading: ThreadingConfig,
    pub objects: Vec<ObjectConfig>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            resolution: Resolution::default(),
            renderer: RendererType::default(),
            image_filter: ImageFilter::default(),
            texture_filter: TextureFilter::default(),
            projection: Projection::default(),
            viewport: Viewport::default(),
            camera: CameraConfig::default(),
            light: Light::default(),
            clear_color: Color::new(0.0, 0.0, 0.0, 0.0),
            depth_function: DepthFunction::default(),
            threading: ThreadingConfig::default(),
            objects: Vec::new(),
        }
    }
}

impl SceneConfig {
    pub fn from_json_str(json: &str) -> ClockworkResult<Self> {
        serde_json::from_str(json).map_err(|e| ClockworkError::serde(e.to_string()))
    }

    pub fn from_path(path: &Path) -> ClockworkResult<Self> {
        let file = File::open(path).map_err(|e| ClockworkError::file_not_accessible(path, e))?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| ClockworkError::serde(format!("{}: {e}", path.display())))
    }

    pub fn validate(&self) -> ClockworkResult<()> {
        if self.objects.is_empty() {
            return Err(ClockworkError::validation("scene must list at least one object"));
        }
        if self.threading.threads == Some(0) {
            return Err(ClockworkError::validation(
                "threading 'threads' must be >= 1 when set",
            ));
        }

        let p = &self.projection;
        if !(p.near.is_finite() && p.far.is_finite() && p.near < p.far) {
            return Err(ClockworkError::validation("projection needs near < far"));
        }
        match p.kind {
            ProjectionType::Perspective => {
                if p.near <= 0.0 {
                    return Err(ClockworkError::validation(
                        "perspective projection needs near > 0",
                    ));
                }
                if !(p.fov_y > 0.0 && p.fov_y < std::f64::consts::PI) {
                    return Err(ClockworkError::validation(
                        "perspective fov_y must be in (0, pi) radians",
                    ));
                }
            }
            ProjectionType::Orthographic => {
                if !(p.height > 0.0) {
                    return Err(ClockworkError::validation(
                        "orthographic height must be > 0",
                    ));
                }
            }
        }

        let v = &self.viewport;
        if !(v.width > 0.0 && v.height > 0.0) {
            return Err(ClockworkError::validation("viewport width/height must be > 0"));
        }
        if self.camera.eye == self.camera.target {
            return Err(ClockworkError::validation("camera eye and target must differ"));
        }
        Ok(())
    }

    pub fn session_opts(&self) -> RenderSessionOpts {
        RenderSessionOpts {
            multi_threaded: self.threading.multi_threaded,
            threads: self.threading.threads,
            resolution: self.resolution,
        }
    }

    /// Apply the clear colour and depth function.
    pub fn configure_framebuffer(&self, framebuffer: &mut Framebuffer) {
        framebuffer.set_pixel_clear_value(self.clear_color.to_argb32());
        framebuffer.set_depth_function(self.depth_function);
    }

    pub fn viewer(&self) -> Viewer {
        Viewer {
            eye: self.camera.eye,
            target: self.camera.target,
            up: self.camera.up,
            projection: self.projection,
            viewport: self.viewport,
            renderer: self.renderer,
            image_filter: self.image_filter,
            texture_filter: self.texture_filter,
            light: self.light,
        }
    }

    /// Load every object's model (each file once) and assemble the scene.
    ///
    /// Relative model paths are resolved against `base_dir`.
    pub fn load_scene(&self, base_dir: &Path) -> ClockworkResult<Scene> {
        let mut models: HashMap<PathBuf, Arc<Model3D>> = HashMap::new();
        let mut scene = Scene::new(self.viewer());
        for (i, object) in self.objects.iter().enumerate() {
            let path = base_dir.join(&object.model);
            let model = match models.get(&path) {
                Some(model) => Arc::clone(model),
                None => {
                    let model = Arc::new(load_obj(&path)?);
                    models.insert(path, Arc::clone(&model));
                    model
                }
            };
            let name = object
                .name
                .clone()
                .unwrap_or_else(|| format!("{}#{i}", model.name()));
            scene.add(RigidBody::new(name, model).with_transform(object.transform));
        }
        Ok(scene)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/config.rs"]
mod tests;
