//! Core type definitions for conversion jobs.
//!
//! All enums serialize in lowercase, matching the status strings clients poll.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Media category of an uploaded file, derived from its declared MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaCategory {
    /// Still images (`image/*`).
    Image,
    /// Video files (`video/*`).
    Video,
    /// Audio files (`audio/*`).
    Audio,
    /// Anything else. Never convertible.
    Unknown,
}

impl MediaCategory {
    /// Classify a MIME type by its top-level prefix.
    pub fn from_mime(mime: &str) -> Self {
        let prefix = mime
            .split('/')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match prefix.as_str() {
            "image" if mime.contains('/') => Self::Image,
            "video" if mime.contains('/') => Self::Video,
            "audio" if mime.contains('/') => Self::Audio,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for MediaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Video => write!(f, "video"),
            Self::Audio => write!(f, "audio"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Lifecycle state of a conversion job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Accepted, not yet picked up by its worker.
    Pending,
    /// The worker is building or running the encoder command.
    Processing,
    /// Finished with a usable result.
    Completed,
    /// Finished without a result.
    Failed,
}

impl JobStatus {
    /// Whether no further transitions are allowed from this state.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether the state machine permits moving from `self` to `next`.
    ///
    /// Repeating the current state is not a transition and returns `false`.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing)
                | (Self::Pending, Self::Failed)
                | (Self::Processing, Self::Completed)
                | (Self::Processing, Self::Failed)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Processing => write!(f, "processing"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid job status: {}", s)),
        }
    }
}
