//! # Streaming Error Types
//!
//! Configuration-time failures only. Duplicate requests and stale results
//! are normal traffic and are reported through
//! [`crate::RequestOutcome`] and [`crate::InstallOutcome`] instead.

use tessera_procedural::TerrainError;
use thiserror::Error;

/// Errors that can occur while configuring the streaming layer.
#[derive(Error, Debug)]
pub enum StreamingError {
    /// Generation settings were rejected.
    #[error(transparent)]
    Terrain(#[from] TerrainError),

    /// A streaming parameter is outside its valid domain.
    #[error("invalid streaming parameter `{parameter}`: {reason}")]
    InvalidParameter {
        /// Name of the offending parameter.
        parameter: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// Configuration text could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// A configuration file could not be read or a worker could not spawn.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl StreamingError {
    /// Shorthand for [`StreamingError::InvalidParameter`].
    #[must_use]
    pub fn invalid(parameter: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter,
            reason: reason.into(),
        }
    }
}

/// Result type for streaming operations.
pub type StreamingResult<T> = Result<T, StreamingError>;
