//! Shading stages, one stateless implementation per render style.

use std::sync::Arc;

use smallvec::SmallVec;

use crate::assets::model::{Material, Texture};
use crate::foundation::core::{Color, TexCoords};
use crate::foundation::math::{Fnv1a64, Matrix4, Point3, Point4, Vector3};
use crate::render::filter::TextureFilter;
use crate::render::fragment::{Face, Fragment, Primitive, Vertex, VertexArray};
use crate::render::viewport::Viewport;

/// A point light.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Light {
    pub position: Point3,
    pub color: Color,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            position: Point3::new(4.0, 6.0, 8.0),
            color: Color::WHITE,
        }
    }
}

/// Per-task state shared by every pipeline stage. Captured when the task is created.
#[derive(Clone, Debug)]
pub struct Uniforms {
    pub model_view: Matrix4,
    pub projection: Matrix4,
    pub viewport: Viewport,
    /// Target size in pixels.
    pub width: u32,
    pub height: u32,
    pub material: Material,
    /// Light with its position in view space.
    pub light: Light,
    pub texture: Option<Arc<Texture>>,
    pub texture_filter: TextureFilter,
}

impl Default for Uniforms {
    fn default() -> Self {
        Self {
            model_view: Matrix4::IDENTITY,
            projection: Matrix4::IDENTITY,
            viewport: Viewport::default(),
            width: 1,
            height: 1,
            material: Material::default(),
            light: Light::default(),
            texture: None,
            texture_filter: TextureFilter::default(),
        }
    }
}

impl Uniforms {
    /// Model-space position to clip space.
    pub fn clip_position(&self, position: Point3) -> Point4 {
        let view = self.model_view.transform_point(position).xyz();
        self.projection.transform_point(view)
    }
}

/// Identifies a [`RenderParameters`] implementation.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RenderParametersId {
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
}

impl RenderParametersId {
    pub const ALL: [Self; 9] = [
        Self::Point,
        Self::Wireframe,
        Self::Random,
        Self::Depth,
        Self::Normals,
        Self::Texture,
        Self::Constant,
        Self::Phong,
        Self::Cel,
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
        }
    }
}

crate::render::filter::named_enum_str!(RenderParametersId, "render parameters");

/// The programmable stages of the pipeline.
///
/// Implementations hold no state; one shared instance serves every task.
pub trait RenderParameters: Send + Sync {
    fn id(&self) -> RenderParametersId;

    /// Transform a model-space vertex to window space.
    ///
    /// Returns `None` for vertices on or behind the eye plane or outside the near/far range.
    fn vertex_program(&self, uniforms: &Uniforms, vertex: &Vertex) -> Option<Fragment> {
        let view = uniforms.model_view.transform_point(vertex.position).xyz();
        let clip = uniforms.clip_position(vertex.position);
        let position = uniforms
            .viewport
            .to_window(clip, uniforms.width, uniforms.height)?;
        Some(Fragment {
            position,
            normal: uniforms.model_view.transform_normal(vertex.normal).normalise(),
            view_position: view,
            color: uniforms.material.diffuse,
            uv: vertex.uv,
            discarded: false,
        })
    }

    /// Per-vertex shading that needs the owning face.
    fn post_vertex_program(
        &self,
        _uniforms: &Uniforms,
        _face: &Face,
        _vertex: &Vertex,
        _fragment: &mut Fragment,
    ) {
    }

    /// Group a processed triangle into primitives.
    fn primitive_assembly(&self, _uniforms: &Uniforms, triangle: [Fragment; 3], out: &mut VertexArray) {
        out.push(Primitive::Triangle(triangle));
    }

    /// Final colour of a rasterised fragment.
    fn fragment_program(&self, uniforms: &Uniforms, fragment: &Fragment) -> Color;
}

/// A model-space vertex together with its clip-space position.
#[derive(Clone, Copy)]
struct ClipVertex {
    vertex: Vertex,
    clip: Point4,
}

/// Clip-space planes bounding the visible depth range: near (`z >= -w`) and far (`z <= w`).
#[derive(Clone, Copy)]
enum DepthPlane {
    Near,
    Far,
}

impl ClipVertex {
    /// Signed distance to `plane`; inside when non-negative.
    fn distance(&self, plane: DepthPlane) -> f64 {
        match plane {
            DepthPlane::Near => self.clip.w + self.clip.z,
            DepthPlane::Far => self.clip.w - self.clip.z,
        }
    }

    fn inside(&self) -> bool {
        self.distance(DepthPlane::Near) >= 0.0 && self.distance(DepthPlane::Far) >= 0.0
    }

    /// Model-space attributes interpolate with the same parameter as the clip position.
    fn lerp(&self, other: &Self, t: f64) -> Self {
        let (a, b) = (&self.vertex, &other.vertex);
        let mix = |p: f64, q: f64| p + (q - p) * t;
        Self {
            vertex: Vertex {
                position: a.position + (b.position - a.position) * t,
                normal: a.normal + (b.normal - a.normal) * t,
                uv: a.uv * (1.0 - t) + b.uv * t,
            },
            clip: Point4::new(
                mix(self.clip.x, other.clip.x),
                mix(self.clip.y, other.clip.y),
                mix(self.clip.z, other.clip.z),
                mix(self.clip.w, other.clip.w),
            ),
        }
    }
}

type ClipPolygon = SmallVec<[ClipVertex; 8]>;

/// One Sutherland-Hodgman pass against `plane`.
fn clip_against(polygon: &[ClipVertex], plane: DepthPlane) -> ClipPolygon {
    let mut out = ClipPolygon::new();
    for (i, current) in polygon.iter().enumerate() {
        let previous = &polygon[(i + polygon.len() - 1) % polygon.len()];
        let (dp, dc) = (previous.distance(plane), current.distance(plane));
        if dc >= 0.0 {
            if dp < 0.0 {
                out.push(previous.lerp(current, dp / (dp - dc)));
            }
            out.push(*current);
        } else if dp >= 0.0 {
            out.push(previous.lerp(current, dp / (dp - dc)));
        }
    }
    out
}

fn assemble(
    parameters: &dyn RenderParameters,
    uniforms: &Uniforms,
    face: &Face,
    vertices: [&Vertex; 3],
    out: &mut VertexArray,
) {
    let mut fragments = [Fragment::default(); 3];
    for (vertex, slot) in vertices.into_iter().zip(fragments.iter_mut()) {
        let Some(mut fragment) = parameters.vertex_program(uniforms, vertex) else {
            return;
        };
        parameters.post_vertex_program(uniforms, face, vertex, &mut fragment);
        *slot = fragment;
    }
    parameters.primitive_assembly(uniforms, fragments, out);
}

/// Run the geometry stages over one face: vertex program, post-vertex program and primitive
/// assembly.
///
/// Faces crossing the near or far plane are clipped in clip space and fan-triangulated; faces
/// entirely outside the depth range are dropped.
pub fn process_face(
    parameters: &dyn RenderParameters,
    uniforms: &Uniforms,
    positions: &[Point3],
    face: &Face,
    out: &mut VertexArray,
) {
    let mut corners = ClipPolygon::new();
    for corner in 0..3 {
        let Some(&position) = positions.get(face.indices[corner] as usize) else {
            return;
        };
        corners.push(ClipVertex {
            vertex: Vertex {
                position,
                normal: face.normals[corner],
                uv: face.uvs[corner],
            },
            clip: uniforms.clip_position(position),
        });
    }

    if corners.iter().all(ClipVertex::inside) {
        let [a, b, c] = [&corners[0].vertex, &corners[1].vertex, &corners[2].vertex];
        assemble(parameters, uniforms, face, [a, b, c], out);
        return;
    }

    let clipped = clip_against(&clip_against(&corners, DepthPlane::Near), DepthPlane::Far);
    if clipped.len() < 3 {
        return;
    }
    for i in 1..clipped.len() - 1 {
        let triangle = [&clipped[0].vertex, &clipped[i].vertex, &clipped[i + 1].vertex];
        assemble(parameters, uniforms, face, triangle, out);
    }
}

/// Phong reflection of `base` at a view-space surface point.
pub fn phong(uniforms: &Uniforms, normal: Vector3, position: Point3, base: Color) -> Color {
    let material = &uniforms.material;
    let light = &uniforms.light;
    let n = normal.normalise();
    let l = (light.position - position).normalise();
    let v = (-position).normalise();
    let diffuse = n.dot(l).max(0.0);
    let specular = if diffuse > 0.0 {
        l.reflect(n).dot(v).max(0.0).powf(material.shininess.max(1.0))
    } else {
        0.0
    };

    let channel = |ambient: f64, base: f64, spec: f64, light: f64| {
        ambient * base + light * (base * diffuse + spec * specular)
    };
    Color::new(
        channel(material.ambient.red, base.red, material.specular.red, light.color.red),
        channel(material.ambient.green, base.green, material.specular.green, light.color.green),
        channel(material.ambient.blue, base.blue, material.specular.blue, light.color.blue),
        material.opacity(),
    )
}

fn diffuse_intensity(uniforms: &Uniforms, normal: Vector3, position: Point3) -> f64 {
    let l = (uniforms.light.position - position).normalise();
    normal.normalise().dot(l).max(0.0)
}

fn surface_color(uniforms: &Uniforms, uv: TexCoords) -> Color {
    match &uniforms.texture {
        Some(texture) => texture
            .sample(uv, uniforms.texture_filter)
            .modulate(uniforms.material.diffuse),
        None => uniforms.material.diffuse,
    }
}

/// Eight-by-eight checkerboard used when no texture is bound.
fn checkerboard(uv: TexCoords) -> Color {
    let cell = |t: f64| (t * 8.0).floor() as i64;
    if (cell(uv.u) + cell(uv.v)).rem_euclid(2) == 0 {
        Color::WHITE
    } else {
        Color::gray(0.25)
    }
}

pub struct PointParameters;

impl RenderParameters for PointParameters {
    fn id(&self) -> RenderParametersId {
        RenderParametersId::Point
    }

    fn primitive_assembly(&self, _uniforms: &Uniforms, triangle: [Fragment; 3], out: &mut VertexArray) {
        for f in triangle {
            out.push(Primitive::Point(f));
        }
    }

    fn fragment_program(&self, _uniforms: &Uniforms, fragment: &Fragment) -> Color {
        fragment.color
    }
}

pub struct WireframeParameters;

impl RenderParameters for WireframeParameters {
    fn id(&self) -> RenderParametersId {
        RenderParametersId::Wireframe
    }

    fn post_vertex_program(&self, _: &Uniforms, _: &Face, _: &Vertex, fragment: &mut Fragment) {
        fragment.color = Color::WHITE;
    }

    fn primitive_assembly(&self, _uniforms: &Uniforms, triangle: [Fragment; 3], out: &mut VertexArray) {
        let [a, b, c] = triangle;
        out.push(Primitive::Line([a, b]));
        out.push(Primitive::Line([b, c]));
        out.push(Primitive::Line([c, a]));
    }

    fn fragment_program(&self, _uniforms: &Uniforms, fragment: &Fragment) -> Color {
        fragment.color
    }
}

/// One pseudo-random colour per face, stable across frames.
pub struct RandomParameters;

impl RandomParameters {
    pub fn face_color(face: &Face) -> Color {
        let mut hasher = Fnv1a64::new_default();
        hasher.write_u64(face.index as u64);
        let h = hasher.finish();
        let byte = |shift: u32| f64::from(((h >> shift) & 0xFF) as u8) / 255.0;
        Color::rgb(byte(0), byte(8), byte(16))
    }
}

impl RenderParameters for RandomParameters {
    fn id(&self) -> RenderParametersId {
        RenderParametersId::Random
    }

    fn post_vertex_program(&self, _: &Uniforms, face: &Face, _: &Vertex, fragment: &mut Fragment) {
        fragment.color = Self::face_color(face);
    }

    fn fragment_program(&self, _uniforms: &Uniforms, fragment: &Fragment) -> Color {
        fragment.color
    }
}

/// Window depth as a gray level, near is bright.
pub struct DepthParameters;

impl RenderParameters for DepthParameters {
    fn id(&self) -> RenderParametersId {
        RenderParametersId::Depth
    }

    fn fragment_program(&self, _uniforms: &Uniforms, fragment: &Fragment) -> Color {
        Color::gray((1.0 - fragment.position.z).clamp(0.0, 1.0))
    }
}

/// View-space normals mapped from `[-1, 1]` to `[0, 1]`.
pub struct NormalsParameters;

impl RenderParameters for NormalsParameters {
    fn id(&self) -> RenderParametersId {
        RenderParametersId::Normals
    }

    fn fragment_program(&self, _uniforms: &Uniforms, fragment: &Fragment) -> Color {
        let n = fragment.normal.normalise();
        Color::rgb(n.x * 0.5 + 0.5, n.y * 0.5 + 0.5, n.z * 0.5 + 0.5)
    }
}

pub struct TextureParameters;

impl RenderParameters for TextureParameters {
    fn id(&self) -> RenderParametersId {
        RenderParametersId::Texture
    }

    fn fragment_program(&self, uniforms: &Uniforms, fragment: &Fragment) -> Color {
        match &uniforms.texture {
            Some(texture) => texture.sample(fragment.uv, uniforms.texture_filter),
            None => checkerboard(fragment.uv),
        }
    }
}

/// Flat shading: one Lambert colour per face, evaluated at its centroid.
pub struct ConstantParameters;

impl RenderParameters for ConstantParameters {
    fn id(&self) -> RenderParametersId {
        RenderParametersId::Constant
    }

    fn post_vertex_program(&self, uniforms: &Uniforms, face: &Face, _: &Vertex, fragment: &mut Fragment) {
        fragment.normal = uniforms
            .model_view
            .transform_normal(face.mean_normal())
            .normalise();
    }

    fn primitive_assembly(&self, uniforms: &Uniforms, mut triangle: [Fragment; 3], out: &mut VertexArray) {
        let centroid =
            (triangle[0].view_position + triangle[1].view_position + triangle[2].view_position)
                * (1.0 / 3.0);
        let m = &uniforms.material;
        let k = diffuse_intensity(uniforms, triangle[0].normal, centroid);
        let color = (m.ambient.modulate(m.diffuse) + m.diffuse * k).with_alpha(m.opacity());
        for f in &mut triangle {
            f.color = color;
        }
        out.push(Primitive::Triangle(triangle));
    }

    fn fragment_program(&self, _uniforms: &Uniforms, fragment: &Fragment) -> Color {
        fragment.color
    }
}

/// Per-fragment Phong lighting, textured when a texture is bound.
pub struct PhongParameters;

impl RenderParameters for PhongParameters {
    fn id(&self) -> RenderParametersId {
        RenderParametersId::Phong
    }

    fn fragment_program(&self, uniforms: &Uniforms, fragment: &Fragment) -> Color {
        let base = surface_color(uniforms, fragment.uv);
        phong(uniforms, fragment.normal, fragment.view_position, base)
    }
}

/// Toon shading with the diffuse term quantised into bands.
pub struct CelParameters;

impl CelParameters {
    pub const BANDS: f64 = 4.0;
}

impl RenderParameters for CelParameters {
    fn id(&self) -> RenderParametersId {
        RenderParametersId::Cel
    }

    fn fragment_program(&self, uniforms: &Uniforms, fragment: &Fragment) -> Color {
        let k = diffuse_intensity(uniforms, fragment.normal, fragment.view_position);
        let banded = (k * Self::BANDS).ceil() / Self::BANDS;
        let base = surface_color(uniforms, fragment.uv);
        let m = &uniforms.material;
        (m.ambient.modulate(base) + base * banded).with_alpha(m.opacity())
    }
}

static POINT: PointParameters = PointParameters;
static WIREFRAME: WireframeParameters = WireframeParameters;
static RANDOM: RandomParameters = RandomParameters;
static DEPTH: DepthParameters = DepthParameters;
static NORMALS: NormalsParameters = NormalsParameters;
static TEXTURE: TextureParameters = TextureParameters;
static CONSTANT: ConstantParameters = ConstantParameters;
static PHONG: PhongParameters = PhongParameters;
static CEL: CelParameters = CelParameters;

/// The shared instance for `id`.
pub fn render_parameters(id: RenderParametersId) -> &'static dyn RenderParameters {
    match id {
        RenderParametersId::Point => &POINT,
        RenderParametersId::Wireframe => &WIREFRAME,
        RenderParametersId::Random => &RANDOM,
        RenderParametersId::Depth => &DEPTH,
        RenderParametersId::Normals => &NORMALS,
        RenderParametersId::Texture => &TEXTURE,
        RenderParametersId::Constant => &CONSTANT,
        RenderParametersId::Phong => &PHONG,
        RenderParametersId::Cel => &CEL,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/parameters.rs"]
mod tests;
