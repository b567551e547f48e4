use std::path::PathBuf;

/// Result alias used across the crate's fallible boundaries (IO, configuration, parsing).
pub type ClockworkResult<T> = Result<T, ClockworkError>;

/// Errors raised outside the rendering hot path.
///
/// The rasteriser, the framebuffer and the scheduler never fail; they treat malformed geometry
/// and out-of-range coordinates as no-ops. Everything that touches files, configuration or
/// thread-pool construction reports through this type.
#[derive(thiserror::Error, Debug)]
pub enum ClockworkError {
    /// A file could not be opened for reading.
    #[error("file not accessible: {}", path.display())]
    FileNotAccessible {
        /// The path that was requested.
        path: PathBuf,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },

    /// Malformed model or material text.
    #[error("parse error at line {line}: {message}")]
    Parse {
        /// 1-based line number in the offending source.
        line: usize,
        /// Human-readable description.
        message: String,
    },

    /// Invalid configuration or API usage.
    #[error("validation error: {0}")]
    Validation(String),

    /// Scene description (de)serialization failure.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Context-wrapped foreign error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ClockworkError {
    /// Build a [`ClockworkError::FileNotAccessible`] value.
    pub fn file_not_accessible(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileNotAccessible {
            path: path.into(),
            source,
        }
    }

    /// Build a [`ClockworkError::Parse`] value.
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    /// Build a [`ClockworkError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ClockworkError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
