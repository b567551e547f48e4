use std::sync::Arc;

use crate::assets::model::Model3D;
use crate::foundation::core::Transform;

/// A renderable scene object: shared geometry placed by a transform.
#[derive(Clone, Debug)]
pub struct RigidBody {
    pub name: String,
    pub model: Arc<Model3D>,
    pub transform: Transform,
}

impl RigidBody {
    pub fn new(name: impl Into<String>, model: Arc<Model3D>) -> Self {
        Self {
            name: name.into(),
            model,
            transform: Transform::default(),
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }
}
