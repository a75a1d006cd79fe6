//! Error types for mediaforge-av.

use crate::classify::Diagnosis;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while validating, building, or running a conversion.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The option payload failed validation. Raised before any process is spawned.
    #[error("invalid option `{field}`: {message}")]
    InvalidOption { field: String, message: String },

    /// The encoder process could not be started at all.
    #[error("failed to start {tool}: {message}")]
    ProcessStart { tool: String, message: String },

    /// The encoder ran and exited unsuccessfully.
    #[error("{0}")]
    ProcessRuntime(Diagnosis),

    /// A required external tool is not available.
    #[error("tool not found: {tool}")]
    ToolNotFound { tool: String },

    /// Command construction reached a combination validation should have excluded.
    #[error("internal inconsistency: {0}")]
    InternalInconsistency(String),

    /// Staging directory error.
    #[error("staging error: {0}")]
    Staging(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an invalid option error.
    pub fn invalid_option(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidOption {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a process start error.
    pub fn process_start(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProcessStart {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create a tool not found error.
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::ToolNotFound { tool: tool.into() }
    }

    /// Create an internal inconsistency error.
    pub fn inconsistency(message: impl Into<String>) -> Self {
        Self::InternalInconsistency(message.into())
    }

    /// Name of the offending field for [`Error::InvalidOption`].
    pub fn option_field(&self) -> Option<&str> {
        match self {
            Self::InvalidOption { field, .. } => Some(field),
            _ => None,
        }
    }
}
