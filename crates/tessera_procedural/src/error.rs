//! # Terrain Error Types
//!
//! All errors that can occur while configuring or running generation.
//!
//! Generation itself is pure arithmetic; anything that fails is a
//! configuration or programming error and is reported once, up front.

use thiserror::Error;

/// Errors that can occur in the generation pipeline.
#[derive(Error, Debug)]
pub enum TerrainError {
    /// A parameter is outside its valid domain.
    #[error("invalid parameter `{parameter}`: {reason}")]
    InvalidParameter {
        /// Name of the offending parameter.
        parameter: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// A grid does not match the dimensions it was paired with.
    #[error("dimension mismatch: expected {expected} cells, got {actual}")]
    DimensionMismatch {
        /// Cells implied by width x height.
        expected: usize,
        /// Cells actually supplied.
        actual: usize,
    },

    /// Configuration text could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// Configuration file could not be read.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl TerrainError {
    /// Shorthand for [`TerrainError::InvalidParameter`].
    #[must_use]
    pub fn invalid(parameter: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter,
            reason: reason.into(),
        }
    }
}

/// Result type for generation operations.
pub type TerrainResult<T> = Result<T, TerrainError>;
