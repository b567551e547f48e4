use std::fmt;

use crate::foundation::core::{Color, TexCoords};
use crate::foundation::math::{Point3, Point4, Vector3};

/// A model-space vertex as fed to the vertex program.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vertex {
    pub position: Point3,
    pub normal: Vector3,
    pub uv: TexCoords,
}

/// A triangular face of a model: position indices plus per-corner normals and mapping coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Face {
    /// Position of the face within its model; stable across frames.
    pub index: usize,
    pub indices: [u32; 3],
    pub normals: [Vector3; 3],
    pub uvs: [TexCoords; 3],
}

impl Face {
    /// Average of the corner normals, normalised.
    pub fn mean_normal(&self) -> Vector3 {
        (self.normals[0] + self.normals[1] + self.normals[2]).normalise()
    }
}

/// A fragment: the output of the vertex stage and, after rasterisation, a candidate pixel.
///
/// `position` holds window-space `x`/`y`, window depth in `z` and `1/w_clip` in `w`. Rasterised
/// fragments sit on integer pixel coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Fragment {
    pub position: Point4,
    /// View-space surface normal.
    pub normal: Vector3,
    /// View-space position, used for lighting.
    pub view_position: Point3,
    pub color: Color,
    pub uv: TexCoords,
    pub discarded: bool,
}

impl Fragment {
    pub fn x(&self) -> i64 {
        self.position.x.floor() as i64
    }

    pub fn y(&self) -> i64 {
        self.position.y.floor() as i64
    }

    pub fn depth(&self) -> f32 {
        self.position.z as f32
    }

    /// Weighted combination of fragments.
    ///
    /// Window `x`, `y` and depth are interpolated linearly in screen space; the remaining
    /// attributes are perspective-corrected through `position.w`. Weights are expected to sum to 1.
    pub fn blend(parts: &[(&Fragment, f64)]) -> Fragment {
        let mut position = Point4::default();
        let mut inv_w = 0.0;
        for (f, t) in parts {
            position.x += f.position.x * t;
            position.y += f.position.y * t;
            position.z += f.position.z * t;
            inv_w += f.position.w * t;
        }
        position.w = inv_w;

        let correct = |t: f64, w: f64| {
            if inv_w.abs() > crate::foundation::math::EPSILON {
                t * w / inv_w
            } else {
                t
            }
        };

        let mut out = Fragment {
            position,
            color: Color::new(0.0, 0.0, 0.0, 0.0),
            ..Fragment::default()
        };
        for (f, t) in parts {
            let k = correct(*t, f.position.w);
            out.normal += f.normal * k;
            out.view_position += f.view_position * k;
            out.color = out.color + f.color * k;
            out.uv = out.uv + f.uv * k;
            out.discarded |= f.discarded;
        }
        out
    }

    /// Interpolate between two fragments at parameter `t` in `[0, 1]`.
    pub fn lerp(a: &Fragment, b: &Fragment, t: f64) -> Fragment {
        Self::blend(&[(a, 1.0 - t), (b, t)])
    }

    /// Copy of `self` moved onto pixel `(x, y)`.
    pub fn at_pixel(mut self, x: i64, y: i64) -> Fragment {
        self.position.x = x as f64;
        self.position.y = y as f64;
        self
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Fragment(x={}, y={}, depth={}, color=#{:08x}{})",
            self.x(),
            self.y(),
            self.depth(),
            self.color.to_argb32(),
            if self.discarded { ", discarded" } else { "" }
        )
    }
}

/// A primitive ready for rasterisation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Primitive {
    Point(Fragment),
    Line([Fragment; 2]),
    Triangle([Fragment; 3]),
}

impl Primitive {
    pub fn vertices(&self) -> &[Fragment] {
        match self {
            Self::Point(f) => std::slice::from_ref(f),
            Self::Line(v) => v,
            Self::Triangle(v) => v,
        }
    }
}

/// The primitives produced by primitive assembly for one object.
#[derive(Clone, Debug, Default)]
pub struct VertexArray {
    primitives: Vec<Primitive>,
}

impl VertexArray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            primitives: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, primitive: Primitive) {
        self.primitives.push(primitive);
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Primitive> {
        self.primitives.iter()
    }
}

impl<'a> IntoIterator for &'a VertexArray {
    type Item = &'a Primitive;
    type IntoIter = std::slice::Iter<'a, Primitive>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Primitive> for VertexArray {
    fn from_iter<I: IntoIterator<Item = Primitive>>(iter: I) -> Self {
        Self {
            primitives: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/fragment.rs"]
mod tests;
