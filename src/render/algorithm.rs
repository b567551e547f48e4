//! Rasterisation strategies, one stateless implementation per style.

use std::collections::HashMap;

use crate::foundation::math::Vector3;
use crate::render::fragment::{Fragment, VertexArray};
use crate::render::framebuffer::Framebuffer;
use crate::render::parameters::{RenderParameters, Uniforms};
use crate::render::raster;

/// Identifies a [`RenderAlgorithm`] implementation.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RenderAlgorithmId {
    Point,
    Wireframe,
    #[default]
    Polygon,
    BumpMap,
    Deferred,
}

impl RenderAlgorithmId {
    pub const ALL: [Self; 5] = [
        Self::Point,
        Self::Wireframe,
        Self::Polygon,
        Self::BumpMap,
        Self::Deferred,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Point => "point",
            Self::Wireframe => "wireframe",
            Self::Polygon => "polygon",
            Self::BumpMap => "bump_map",
            Self::Deferred => "deferred",
        }
    }
}

crate::render::filter::named_enum_str!(RenderAlgorithmId, "render algorithm");

/// Turns assembled primitives into fragments and writes them to a framebuffer.
///
/// Implementations only mutate the framebuffer through [`Framebuffer::plot`], so one instance can
/// serve any number of concurrent tasks.
pub trait RenderAlgorithm: Send + Sync {
    fn id(&self) -> RenderAlgorithmId;

    /// Rasterise `vertices` and return the number of fragments produced.
    fn rasterise(
        &self,
        parameters: &dyn RenderParameters,
        uniforms: &Uniforms,
        vertices: &VertexArray,
        framebuffer: &Framebuffer,
    ) -> usize;
}

fn shade_and_plot(
    parameters: &dyn RenderParameters,
    uniforms: &Uniforms,
    framebuffer: &Framebuffer,
    fragment: &Fragment,
) {
    framebuffer.plot(fragment, |f| parameters.fragment_program(uniforms, f).to_argb32());
}

/// Vertices only.
pub struct PointAlgorithm;

impl RenderAlgorithm for PointAlgorithm {
    fn id(&self) -> RenderAlgorithmId {
        RenderAlgorithmId::Point
    }

    fn rasterise(
        &self,
        parameters: &dyn RenderParameters,
        uniforms: &Uniforms,
        vertices: &VertexArray,
        framebuffer: &Framebuffer,
    ) -> usize {
        let (w, h) = (framebuffer.width(), framebuffer.height());
        vertices
            .iter()
            .flat_map(|p| p.vertices())
            .map(|v| {
                raster::rasterise_point(v, w, h, |f| {
                    shade_and_plot(parameters, uniforms, framebuffer, &f)
                })
            })
            .sum()
    }
}

/// Edges only.
pub struct WireframeAlgorithm;

impl RenderAlgorithm for WireframeAlgorithm {
    fn id(&self) -> RenderAlgorithmId {
        RenderAlgorithmId::Wireframe
    }

    fn rasterise(
        &self,
        parameters: &dyn RenderParameters,
        uniforms: &Uniforms,
        vertices: &VertexArray,
        framebuffer: &Framebuffer,
    ) -> usize {
        let (w, h) = (framebuffer.width(), framebuffer.height());
        vertices
            .iter()
            .map(|p| {
                raster::rasterise_outline(p, w, h, |f| {
                    shade_and_plot(parameters, uniforms, framebuffer, &f)
                })
            })
            .sum()
    }
}

/// Filled primitives with interpolated attributes.
pub struct PolygonAlgorithm;

impl RenderAlgorithm for PolygonAlgorithm {
    fn id(&self) -> RenderAlgorithmId {
        RenderAlgorithmId::Polygon
    }

    fn rasterise(
        &self,
        parameters: &dyn RenderParameters,
        uniforms: &Uniforms,
        vertices: &VertexArray,
        framebuffer: &Framebuffer,
    ) -> usize {
        let (w, h) = (framebuffer.width(), framebuffer.height());
        vertices
            .iter()
            .map(|p| {
                raster::rasterise_filled(p, w, h, |f| {
                    shade_and_plot(parameters, uniforms, framebuffer, &f)
                })
            })
            .sum()
    }
}

/// Filled primitives whose normals are perturbed by a procedural height field over the mapping
/// coordinates.
pub struct BumpMapAlgorithm;

impl BumpMapAlgorithm {
    /// Spatial frequency of the height field, in radians per unit of `u`/`v`.
    pub const FREQUENCY: f64 = 40.0 * std::f64::consts::PI;
    pub const AMPLITUDE: f64 = 0.004;

    /// Tilt `fragment.normal` by the gradient of `h(u, v) = A sin(f u) sin(f v)`.
    pub fn perturb(fragment: &mut Fragment) {
        let n = fragment.normal.normalise();
        if n == Vector3::ZERO {
            return;
        }
        let (u, v) = (fragment.uv.u, fragment.uv.v);
        let k = Self::AMPLITUDE * Self::FREQUENCY;
        let dh_du = k * (Self::FREQUENCY * u).cos() * (Self::FREQUENCY * v).sin();
        let dh_dv = k * (Self::FREQUENCY * u).sin() * (Self::FREQUENCY * v).cos();

        let helper = if n.dot(Vector3::UNIT_Y).abs() > 0.9 {
            Vector3::UNIT_Z
        } else {
            Vector3::UNIT_Y
        };
        let tangent = n.cross(helper).normalise();
        let bitangent = n.cross(tangent);
        fragment.normal = (n - tangent * dh_du - bitangent * dh_dv).normalise();
    }
}

impl RenderAlgorithm for BumpMapAlgorithm {
    fn id(&self) -> RenderAlgorithmId {
        RenderAlgorithmId::BumpMap
    }

    fn rasterise(
        &self,
        parameters: &dyn RenderParameters,
        uniforms: &Uniforms,
        vertices: &VertexArray,
        framebuffer: &Framebuffer,
    ) -> usize {
        let (w, h) = (framebuffer.width(), framebuffer.height());
        vertices
            .iter()
            .map(|p| {
                raster::rasterise_filled(p, w, h, |mut f| {
                    Self::perturb(&mut f);
                    shade_and_plot(parameters, uniforms, framebuffer, &f)
                })
            })
            .sum()
    }
}

/// Two passes: resolve the visible fragment per pixel for the whole object, then shade each
/// covered pixel once.
pub struct DeferredAlgorithm;

impl RenderAlgorithm for DeferredAlgorithm {
    fn id(&self) -> RenderAlgorithmId {
        RenderAlgorithmId::Deferred
    }

    fn rasterise(
        &self,
        parameters: &dyn RenderParameters,
        uniforms: &Uniforms,
        vertices: &VertexArray,
        framebuffer: &Framebuffer,
    ) -> usize {
        let (w, h) = (framebuffer.width(), framebuffer.height());
        let depth_function = framebuffer.depth_function();
        let mut gbuffer: HashMap<usize, Fragment> = HashMap::new();

        for primitive in vertices {
            raster::rasterise_filled(primitive, w, h, |f| {
                if f.discarded {
                    return;
                }
                let Some(offset) = framebuffer.offset(f.x(), f.y()) else {
                    return;
                };
                match gbuffer.get_mut(&offset) {
                    Some(kept) if depth_function.passes(f.depth(), kept.depth()) => *kept = f,
                    Some(_) => {}
                    None => {
                        gbuffer.insert(offset, f);
                    }
                }
            });
        }

        for fragment in gbuffer.values() {
            shade_and_plot(parameters, uniforms, framebuffer, fragment);
        }
        gbuffer.len()
    }
}

static POINT: PointAlgorithm = PointAlgorithm;
static WIREFRAME: WireframeAlgorithm = WireframeAlgorithm;
static POLYGON: PolygonAlgorithm = PolygonAlgorithm;
static BUMP_MAP: BumpMapAlgorithm = BumpMapAlgorithm;
static DEFERRED: DeferredAlgorithm = DeferredAlgorithm;

/// The shared instance for `id`.
pub fn render_algorithm(id: RenderAlgorithmId) -> &'static dyn RenderAlgorithm {
    match id {
        RenderAlgorithmId::Point => &POINT,
        RenderAlgorithmId::Wireframe => &WIREFRAME,
        RenderAlgorithmId::Polygon => &POLYGON,
        RenderAlgorithmId::BumpMap => &BUMP_MAP,
        RenderAlgorithmId::Deferred => &DEFERRED,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/algorithm.rs"]
mod tests;
