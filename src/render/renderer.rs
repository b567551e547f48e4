use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::assets::model::Model3D;
use crate::concurrency::task::Task;
use crate::render::algorithm::{RenderAlgorithm, RenderAlgorithmId, render_algorithm};
use crate::render::fragment::VertexArray;
use crate::render::framebuffer::Framebuffer;
use crate::render::parameters::{
    Light, RenderParameters, RenderParametersId, Uniforms, process_face, render_parameters,
};
use crate::scene::body::RigidBody;
use crate::scene::viewer::Viewer;

/// Render styles.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RendererType {
    Point,
    Wireframe,
    Random,
    Depth,
    Normals,
    Texture,
    Constant,
    #[default]
    Phong,
    Cel,
    Bump,
    Deferred,
}

impl RendererType {
    pub const ALL: [Self; 11] = [
        Self::Point,
        Self::Wireframe,
        Self::Random,
        Self::Depth,
        Self::Normals,
        Self::Texture,
        Self::Constant,
        Self::Phong,
        Self::Cel,
        Self::Bump,
        Self::Deferred,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Point => "point",
            Self::Wireframe => "wireframe",
            Self::Random => "random",
            Self::Depth => "depth",
            Self::Normals => "normals",
            Self::Texture => "texture",
            Self::Constant => "constant",
            Self::Phong => "phong",
            Self::Cel => "cel",
            Self::Bump => "bump",
            Self::Deferred => "deferred",
        }
    }
}

crate::render::filter::named_enum_str!(RendererType, "renderer");

/// A fixed pairing of rasterisation strategy and shading stages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Renderer {
    kind: RendererType,
    algorithm: RenderAlgorithmId,
    parameters: RenderParametersId,
}

const fn pairing(
    kind: RendererType,
    algorithm: RenderAlgorithmId,
    parameters: RenderParametersId,
) -> Renderer {
    Renderer {
        kind,
        algorithm,
        parameters,
    }
}

static RENDERERS: [Renderer; 11] = [
    pairing(RendererType::Point, RenderAlgorithmId::Point, RenderParametersId::Point),
    pairing(
        RendererType::Wireframe,
        RenderAlgorithmId::Wireframe,
        RenderParametersId::Wireframe,
    ),
    pairing(RendererType::Random, RenderAlgorithmId::Polygon, RenderParametersId::Random),
    pairing(RendererType::Depth, RenderAlgorithmId::Polygon, RenderParametersId::Depth),
    pairing(RendererType::Normals, RenderAlgorithmId::Polygon, RenderParametersId::Normals),
    pairing(RendererType::Texture, RenderAlgorithmId::Polygon, RenderParametersId::Texture),
    pairing(RendererType::Constant, RenderAlgorithmId::Polygon, RenderParametersId::Constant),
    pairing(RendererType::Phong, RenderAlgorithmId::Polygon, RenderParametersId::Phong),
    pairing(RendererType::Cel, RenderAlgorithmId::Polygon, RenderParametersId::Cel),
    pairing(RendererType::Bump, RenderAlgorithmId::BumpMap, RenderParametersId::Phong),
    pairing(RendererType::Deferred, RenderAlgorithmId::Deferred, RenderParametersId::Phong),
];

/// The shared renderer for `kind`.
pub fn renderer(kind: RendererType) -> &'static Renderer {
    // RENDERERS is laid out in declaration order of RendererType.
    &RENDERERS[kind as usize]
}

impl Renderer {
    pub fn kind(&self) -> RendererType {
        self.kind
    }

    pub fn algorithm(&self) -> &'static dyn RenderAlgorithm {
        render_algorithm(self.algorithm)
    }

    pub fn parameters(&self) -> &'static dyn RenderParameters {
        render_parameters(self.parameters)
    }

    /// Bind `body`, seen through `viewer`, to a task drawing into `framebuffer`.
    ///
    /// The body's transform and the viewer state are copied into the task; the model geometry is
    /// shared. Returns `None` for a body without faces.
    pub fn create_render_task(
        &self,
        body: &RigidBody,
        viewer: &Viewer,
        framebuffer: &Arc<Framebuffer>,
    ) -> Option<RenderTask> {
        if body.model.face_count() == 0 {
            return None;
        }
        let (width, height) = (framebuffer.width(), framebuffer.height());
        let view = viewer.view_matrix();
        let light = Light {
            position: view.transform_point(viewer.light.position).xyz(),
            color: viewer.light.color,
        };
        let uniforms = Uniforms {
            model_view: view * body.transform.to_matrix(),
            projection: viewer.projection_matrix(width, height),
            viewport: viewer.viewport,
            width,
            height,
            material: *body.model.material(),
            light,
            texture: body.model.texture().cloned(),
            texture_filter: viewer.texture_filter,
        };
        Some(RenderTask {
            name: body.name.clone(),
            model: Arc::clone(&body.model),
            uniforms,
            algorithm: self.algorithm(),
            parameters: self.parameters(),
            framebuffer: Arc::clone(framebuffer),
            fragments: None,
        })
    }
}

/// Draws one object into a shared framebuffer.
pub struct RenderTask {
    name: String,
    model: Arc<Model3D>,
    uniforms: Uniforms,
    algorithm: &'static dyn RenderAlgorithm,
    parameters: &'static dyn RenderParameters,
    framebuffer: Arc<Framebuffer>,
    fragments: Option<Arc<AtomicU64>>,
}

impl RenderTask {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn face_count(&self) -> usize {
        self.model.face_count()
    }

    pub fn uniforms(&self) -> &Uniforms {
        &self.uniforms
    }

    /// Add the number of rasterised fragments to `counter` when the task runs.
    pub fn with_fragment_counter(mut self, counter: Arc<AtomicU64>) -> Self {
        self.fragments = Some(counter);
        self
    }

    /// Run the pipeline over every face and return the number of fragments rasterised.
    pub fn execute(&self) -> usize {
        let mut vertices = VertexArray::with_capacity(self.model.face_count());
        let positions = self.model.positions();
        for face in self.model.faces() {
            process_face(self.parameters, &self.uniforms, positions, face, &mut vertices);
        }
        let fragments =
            self.algorithm
                .rasterise(self.parameters, &self.uniforms, &vertices, &self.framebuffer);
        if let Some(counter) = &self.fragments {
            counter.fetch_add(fragments as u64, Ordering::Relaxed);
        }
        tracing::debug!(
            body = %self.name,
            algorithm = %self.algorithm.id(),
            parameters = %self.parameters.id(),
            primitives = vertices.len(),
            fragments,
            "render task finished"
        );
        fragments
    }
}

impl Task for RenderTask {
    /// Larger objects start first.
    fn priority(&self) -> u64 {
        self.model.face_count() as u64
    }

    fn run(self: Box<Self>) {
        self.execute();
    }
}

impl std::fmt::Debug for RenderTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderTask")
            .field("name", &self.name)
            .field("faces", &self.face_count())
            .field("algorithm", &self.algorithm.id())
            .field("parameters", &self.parameters.id())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/renderer.rs"]
mod tests;
