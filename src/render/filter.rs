use crate::foundation::core::Color;

/// Post-processing applied to a finished frame.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ImageFilter {
    #[default]
    None,
    BlackAndWhite,
    Grayscale,
}

impl ImageFilter {
    pub const ALL: [Self; 3] = [Self::None, Self::BlackAndWhite, Self::Grayscale];

    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::BlackAndWhite => "black_and_white",
            Self::Grayscale => "grayscale",
        }
    }

    /// Filter one packed ARGB pixel. Alpha is preserved.
    pub fn apply(self, argb: u32) -> u32 {
        let alpha = argb & 0xFF00_0000;
        let luma = || Color::from_argb32(argb).luminance();
        let rgb = match self {
            Self::None => return argb,
            Self::Grayscale => {
                let l = (luma().clamp(0.0, 1.0) * 255.0).round() as u32;
                (l << 16) | (l << 8) | l
            }
            Self::BlackAndWhite => {
                if luma() >= 0.5 {
                    0x00FF_FFFF
                } else {
                    0
                }
            }
        };
        alpha | rgb
    }
}

/// Sampling mode used when reading texels.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TextureFilter {
    #[default]
    Nearest,
    Bilinear,
}

impl TextureFilter {
    pub const ALL: [Self; 2] = [Self::Nearest, Self::Bilinear];

    pub fn name(self) -> &'static str {
        match self {
            Self::Nearest => "nearest",
            Self::Bilinear => "bilinear",
        }
    }
}

macro_rules! named_enum_str {
    ($ty:ident, $what:literal) => {
        impl ::std::fmt::Display for $ty {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.name())
            }
        }

        impl ::std::str::FromStr for $ty {
            type Err = $crate::foundation::error::ClockworkError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
                Self::ALL
                    .into_iter()
                    .find(|v| v.name() == wanted)
                    .ok_or_else(|| {
                        $crate::foundation::error::ClockworkError::validation(format!(
                            "unknown {} '{s}'",
                            $what
                        ))
                    })
            }
        }
    };
}

named_enum_str!(ImageFilter, "image filter");
named_enum_str!(TextureFilter, "texture filter");

pub(crate) use named_enum_str;

#[cfg(test)]
#[path = "../../tests/unit/render/filter.rs"]
mod tests;
