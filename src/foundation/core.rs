use std::ops::{Add, Mul};

use crate::foundation::math::{Matrix4, Point3, Vector3};

/// Straight-alpha colour with f64 channels in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Color {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    #[serde(default = "one")]
    pub alpha: f64,
}

fn one() -> f64 {
    1.0
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl Color {
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);

    pub const fn new(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    pub const fn rgb(red: f64, green: f64, blue: f64) -> Self {
        Self::new(red, green, blue, 1.0)
    }

    pub fn gray(v: f64) -> Self {
        Self::rgb(v, v, v)
    }

    /// Pack into `0xAARRGGBB`, clamping each channel.
    pub fn to_argb32(self) -> u32 {
        fn channel(v: f64) -> u32 {
            if v.is_nan() {
                return 0;
            }
            (v.clamp(0.0, 1.0) * 255.0).round() as u32
        }
        (channel(self.alpha) << 24)
            | (channel(self.red) << 16)
            | (channel(self.green) << 8)
            | channel(self.blue)
    }

    pub fn from_argb32(argb: u32) -> Self {
        let c = |shift: u32| f64::from((argb >> shift) & 0xFF) / 255.0;
        Self::new(c(16), c(8), c(0), c(24))
    }

    /// Rec. 601 luma.
    pub fn luminance(self) -> f64 {
        0.299 * self.red + 0.587 * self.green + 0.114 * self.blue
    }

    /// Component-wise product; alpha is taken from `self`.
    pub fn modulate(self, rhs: Self) -> Self {
        Self::new(
            self.red * rhs.red,
            self.green * rhs.green,
            self.blue * rhs.blue,
            self.alpha,
        )
    }

    pub fn with_alpha(self, alpha: f64) -> Self {
        Self { alpha, ..self }
    }

    pub fn lerp(self, rhs: Self, t: f64) -> Self {
        self * (1.0 - t) + rhs * t
    }
}

impl Add for Color {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(
            self.red + rhs.red,
            self.green + rhs.green,
            self.blue + rhs.blue,
            self.alpha + rhs.alpha,
        )
    }
}

impl Mul<f64> for Color {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self::new(
            self.red * rhs,
            self.green * rhs,
            self.blue * rhs,
            self.alpha * rhs,
        )
    }
}

/// Texture mapping coordinates; `v` grows downwards (image row order).
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TexCoords {
    pub u: f64,
    pub v: f64,
}

impl TexCoords {
    pub const fn new(u: f64, v: f64) -> Self {
        Self { u, v }
    }
}

impl Add for TexCoords {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.u + rhs.u, self.v + rhs.v)
    }
}

impl Mul<f64> for TexCoords {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.u * rhs, self.v * rhs)
    }
}

/// Object placement in world space.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Transform {
    pub position: Point3,
    /// Euler angles in radians, applied X then Y then Z.
    pub rotation: Vector3,
    pub scale: Vector3, // default (1,1,1)
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vector3::ZERO,
            rotation: Vector3::ZERO,
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    pub fn to_matrix(self) -> Matrix4 {
        // Canonical order:
        // T(position) * Rz * Ry * Rx * S(scale)
        Matrix4::translation(self.position)
            * Matrix4::rotation_z(self.rotation.z)
            * Matrix4::rotation_y(self.rotation.y)
            * Matrix4::rotation_x(self.rotation.x)
            * Matrix4::scaling(self.scale)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
