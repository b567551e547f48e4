use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use crate::foundation::core::{Color, TexCoords};
use crate::foundation::error::{ClockworkError, ClockworkResult};
use crate::foundation::math::{Point3, Vector3};
use crate::render::filter::TextureFilter;
use crate::render::fragment::Face;

/// Surface reflectance of a model.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Material {
    pub ambient: Color,
    pub diffuse: Color,
    pub specular: Color,
    /// 0 is opaque, 1 fully transparent.
    pub transparency: f64,
    /// Specular exponent.
    pub shininess: f64,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ambient: Color::gray(0.1),
            diffuse: Color::gray(0.8),
            specular: Color::gray(0.5),
            transparency: 0.0,
            shininess: 32.0,
        }
    }
}

impl Material {
    pub fn opacity(&self) -> f64 {
        (1.0 - self.transparency).clamp(0.0, 1.0)
    }
}

/// A decoded RGBA texture, rows top to bottom.
#[derive(Clone, Debug, PartialEq)]
pub struct Texture {
    width: u32,
    height: u32,
    texels: Vec<Color>,
}

impl Texture {
    pub fn new(width: u32, height: u32, texels: Vec<Color>) -> ClockworkResult<Self> {
        if width == 0 || height == 0 {
            return Err(ClockworkError::validation("texture must not be empty"));
        }
        if texels.len() != width as usize * height as usize {
            return Err(ClockworkError::validation(format!(
                "texture {width}x{height} expects {} texels, got {}",
                width as usize * height as usize,
                texels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            texels,
        })
    }

    pub fn from_image(image: &image::DynamicImage) -> ClockworkResult<Self> {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        let texels = rgba
            .pixels()
            .map(|p| {
                let [r, g, b, a] = p.0;
                Color::new(
                    f64::from(r) / 255.0,
                    f64::from(g) / 255.0,
                    f64::from(b) / 255.0,
                    f64::from(a) / 255.0,
                )
            })
            .collect();
        Self::new(width, height, texels)
    }

    pub fn load(path: &Path) -> ClockworkResult<Self> {
        let bytes =
            std::fs::read(path).map_err(|e| ClockworkError::file_not_accessible(path, e))?;
        let image = image::load_from_memory(&bytes)
            .with_context(|| format!("decode texture {}", path.display()))?;
        Self::from_image(&image)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn texel(&self, x: i64, y: i64) -> Color {
        let x = x.rem_euclid(i64::from(self.width)) as usize;
        let y = y.rem_euclid(i64::from(self.height)) as usize;
        self.texels[y * self.width as usize + x]
    }

    /// Sample at `uv`, wrapping coordinates outside `[0, 1)`.
    pub fn sample(&self, uv: TexCoords, filter: TextureFilter) -> Color {
        let u = if uv.u.is_finite() { uv.u } else { 0.0 };
        let v = if uv.v.is_finite() { uv.v } else { 0.0 };
        let x = u * f64::from(self.width);
        let y = v * f64::from(self.height);
        match filter {
            TextureFilter::Nearest => self.texel(x.floor() as i64, y.floor() as i64),
            TextureFilter::Bilinear => {
                let (x, y) = (x - 0.5, y - 0.5);
                let (x0, y0) = (x.floor(), y.floor());
                let (fx, fy) = (x - x0, y - y0);
                let (x0, y0) = (x0 as i64, y0 as i64);
                let top = self.texel(x0, y0).lerp(self.texel(x0 + 1, y0), fx);
                let bottom = self.texel(x0, y0 + 1).lerp(self.texel(x0 + 1, y0 + 1), fx);
                top.lerp(bottom, fy)
            }
        }
    }
}

/// Triangulated geometry with one material.
#[derive(Clone, Debug, Default)]
pub struct Model3D {
    name: String,
    positions: Vec<Point3>,
    faces: Vec<Face>,
    material: Material,
    texture: Option<Arc<Texture>>,
}

impl Model3D {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn positions(&self) -> &[Point3] {
        &self.positions
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn set_material(&mut self, material: Material) {
        self.material = material;
    }

    pub fn texture(&self) -> Option<&Arc<Texture>> {
        self.texture.as_ref()
    }

    pub fn set_texture(&mut self, texture: Option<Arc<Texture>>) {
        self.texture = texture;
    }

    /// Append a vertex position and return its index.
    pub fn add_position(&mut self, position: Point3) -> u32 {
        self.positions.push(position);
        (self.positions.len() - 1) as u32
    }

    /// Append a triangle.
    ///
    /// Every index must name an existing position. Missing normals are replaced by the flat face
    /// normal; missing mapping coordinates by `(0, 0)`.
    pub fn add_face(
        &mut self,
        indices: [u32; 3],
        normals: Option<[Vector3; 3]>,
        uvs: Option<[TexCoords; 3]>,
    ) -> ClockworkResult<usize> {
        let count = self.positions.len();
        if let Some(bad) = indices.iter().find(|&&i| i as usize >= count) {
            return Err(ClockworkError::validation(format!(
                "face index {bad} out of range for {count} positions"
            )));
        }
        let [a, b, c] = indices.map(|i| self.positions[i as usize]);
        let normals = normals.unwrap_or_else(|| {
            let n = (b - a).cross(c - a).normalise();
            [n; 3]
        });
        let index = self.faces.len();
        self.faces.push(Face {
            index,
            indices,
            normals,
            uvs: uvs.unwrap_or_default(),
        });
        Ok(index)
    }

    /// Axis-aligned bounds of the positions, or `None` for an empty model.
    pub fn bounds(&self) -> Option<(Point3, Point3)> {
        let first = *self.positions.first()?;
        Some(self.positions.iter().fold((first, first), |(lo, hi), p| {
            (
                Point3::new(lo.x.min(p.x), lo.y.min(p.y), lo.z.min(p.z)),
                Point3::new(hi.x.max(p.x), hi.y.max(p.y), hi.z.max(p.z)),
            )
        }))
    }

    /// A model holding one triangle.
    pub fn triangle(name: impl Into<String>, corners: [Point3; 3]) -> Self {
        let mut model = Self::new(name);
        let indices = corners.map(|p| model.add_position(p));
        // Indices were just created.
        let _ = model.add_face(indices, None, None);
        model
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/model.rs"]
mod tests;
