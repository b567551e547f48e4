//! Clockwork is a software 3D rasteriser.
//!
//! Scenes are drawn on the CPU into a multi-plane [`Framebuffer`] by interchangeable render
//! styles. Each style pairs a [`RenderAlgorithm`] (how primitives become fragments) with a set of
//! [`RenderParameters`] (how vertices and fragments are shaded). Every scene object becomes one
//! [`RenderTask`], and the tasks of a frame run in parallel on a [`ConcurrencySubsystem`].
//!
//! - Load models with [`load_obj`] and place them in a [`Scene`]
//! - Create a [`RenderSession`] and call [`RenderSession::render_frame`]
//! - Read the result back with [`Framebuffer::to_rgba8`]
#![forbid(unsafe_code)]

pub mod assets;
pub mod concurrency;
pub mod foundation;
pub mod render;
pub mod scene;

pub use crate::assets::{Material, Model3D, Texture, load_obj, parse_obj};
pub use crate::concurrency::{ConcurrencySubsystem, FnTask, Task};
pub use crate::foundation::core::{Color, TexCoords, Transform};
pub use crate::foundation::error::{ClockworkError, ClockworkResult};
pub use crate::foundation::math::{Matrix4, Point3, Point4, Vector3};
pub use crate::render::algorithm::{RenderAlgorithm, RenderAlgorithmId, render_algorithm};
pub use crate::render::filter::{ImageFilter, TextureFilter};
pub use crate::render::fragment::{Face, Fragment, Primitive, Vertex, VertexArray};
pub use crate::render::framebuffer::{
    DepthFunction, FrameRGBA, FrameReady, Framebuffer, Resolution, STENCIL_DISCARDED,
};
pub use crate::render::parameters::{
    Light, RenderParameters, RenderParametersId, Uniforms, render_parameters,
};
pub use crate::render::renderer::{RenderTask, Renderer, RendererType, renderer};
pub use crate::render::session::{FrameStats, RenderSession, RenderSessionOpts};
pub use crate::render::viewport::{Projection, ProjectionType, Viewport};
pub use crate::scene::{RigidBody, Scene, SceneConfig, Viewer};
