//! Common error types used by the job registry and its boundaries.

use crate::{JobId, JobStatus};

/// Common error type for mediaforge job bookkeeping.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No job with this identifier is registered.
    #[error("Job not found: {0}")]
    NotFound(JobId),

    /// The job exists but has not produced a result.
    #[error("Job {id} is not completed (status: {status})")]
    NotCompleted {
        /// The job that was looked up.
        id: JobId,
        /// Its status at lookup time.
        status: JobStatus,
    },

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new Internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
