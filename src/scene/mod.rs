pub mod body;
pub mod config;
pub mod viewer;

pub use body::RigidBody;
pub use config::{CameraConfig, ObjectConfig, SceneConfig, ThreadingConfig};
pub use viewer::{Scene, Viewer};
