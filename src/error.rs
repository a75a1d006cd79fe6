//! Error type for the orchestration layer.

use mediaforge_common::JobId;

/// Result type alias using the orchestration Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything the submission, status, and result boundaries can report.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Option validation, command building, or encoder failure.
    #[error(transparent)]
    Conversion(#[from] mediaforge_av::Error),

    /// Registry lookups: unknown job or result not ready.
    #[error(transparent)]
    Job(#[from] mediaforge_common::Error),

    /// The inspector could not describe a file.
    #[error("identification failed: {0}")]
    Identify(String),

    /// Local filesystem failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Offending field of an option payload rejection.
    pub fn option_field(&self) -> Option<&str> {
        match self {
            Self::Conversion(e) => e.option_field(),
            _ => None,
        }
    }

    /// The job this error says does not exist.
    pub fn not_found(&self) -> Option<JobId> {
        match self {
            Self::Job(mediaforge_common::Error::NotFound(id)) => Some(*id),
            _ => None,
        }
    }
}
