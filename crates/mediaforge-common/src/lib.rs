//! Mediaforge-Common: shared identifiers, status types, and errors.
//!
//! - **Typed IDs**: [`JobId`], a UUID wrapper identifying one conversion job
//! - **Core Types**: [`MediaCategory`] and [`JobStatus`]
//! - **Error Handling**: the registry-level [`Error`] and result alias
//!
//! # Examples
//!
//! ```
//! use mediaforge_common::{JobId, JobStatus, MediaCategory};
//!
//! let id = JobId::new();
//! assert_eq!(MediaCategory::from_mime("video/mp4"), MediaCategory::Video);
//! assert!(JobStatus::Completed.is_terminal());
//! # let _ = id;
//! ```

pub mod error;
pub mod ids;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;
