//! # mediaforge-av
//!
//! Everything between a raw option payload and a finished encoder process.
//!
//! - **Options** ([`OptionSet`]) -- typed per-category option sets parsed
//!   from the client's JSON payload.
//! - **Validation** ([`validate`]) -- numeric bounds and cross-field rules,
//!   checked before anything is spawned.
//! - **Command building** ([`command`]) -- deterministic translation into
//!   ffmpeg / ImageMagick argument sequences.
//! - **Process supervision** ([`ProcessRunner`]) -- spawning, stderr
//!   progress extraction, and failure classification ([`classify`]).
//! - **Staging** ([`StagingArea`]) and **tool discovery** ([`ToolPaths`]).

pub mod classify;
pub mod command;
pub mod error;
pub mod options;
pub mod progress;
pub mod runner;
pub mod staging;
pub mod tools;
pub mod validate;

pub use classify::{Diagnosis, FailureKind};
pub use command::{build, ArgumentSequence, ConversionPlan, Encoder, FilterChain};
pub use error::{Error, Result};
pub use options::OptionSet;
pub use runner::{NoProgress, ProcessRunner, ProgressSink};
pub use staging::StagingArea;
pub use tools::{check_tool, check_tools, get_tool_path, require_tool, ToolInfo, ToolPaths};
