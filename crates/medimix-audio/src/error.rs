//! Error types for the audio core.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for audio operations.
pub type AudioResult<T> = Result<T, AudioError>;

/// Errors that can occur while merging, synthesizing or mixing audio.
///
/// All errors are fatal for the operation that raised them. Callers are
/// expected to correct their inputs and start the operation again.
#[derive(Debug, Error)]
pub enum AudioError {
    /// A parameter is out of range, malformed or empty.
    #[error("invalid parameter '{name}': {message}")]
    Validation {
        /// Parameter name.
        name: String,
        /// Expected constraint.
        message: String,
    },

    /// A required file or directory is missing.
    #[error("{what} not found: {}", path.display())]
    NotFound {
        /// What was being looked up (e.g. "speech file").
        what: String,
        /// Path that was checked.
        path: PathBuf,
    },

    /// A mathematically undefined operation was requested.
    #[error("domain error: {message}")]
    Domain {
        /// Error message.
        message: String,
    },

    /// Encoding or decoding a container failed.
    #[error("codec error for '{}': {message}", path.display())]
    Codec {
        /// File being encoded or decoded.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AudioError {
    /// Creates a validation error naming the offending parameter.
    pub fn invalid_param(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates a not-found error.
    pub fn not_found(what: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::NotFound {
            what: what.into(),
            path: path.into(),
        }
    }

    /// Creates a domain error.
    pub fn domain(message: impl Into<String>) -> Self {
        Self::Domain {
            message: message.into(),
        }
    }

    /// Creates a codec error.
    pub fn codec(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Codec {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Stable diagnostic code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            AudioError::Validation { .. } => "MIX_001",
            AudioError::NotFound { .. } => "MIX_002",
            AudioError::Domain { .. } => "MIX_003",
            AudioError::Codec { .. } => "MIX_004",
            AudioError::Io(_) => "MIX_005",
        }
    }

    /// Error category used in diagnostics.
    pub fn category(&self) -> &'static str {
        match self {
            AudioError::Validation { .. } => "validation",
            AudioError::NotFound { .. } | AudioError::Io(_) => "io",
            AudioError::Domain { .. } => "domain",
            AudioError::Codec { .. } => "codec",
        }
    }

    /// Returns true for out-of-range or malformed parameters.
    pub fn is_validation(&self) -> bool {
        matches!(self, AudioError::Validation { .. })
    }

    /// Returns true for missing files or directories.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AudioError::NotFound { .. })
    }

    /// Returns true for undefined numeric operations.
    pub fn is_domain(&self) -> bool {
        matches!(self, AudioError::Domain { .. })
    }
}
