//! Mediaforge - media conversion job orchestration
//!
//! This library crate exposes the orchestration layer for integration testing.

pub mod config;
pub mod error;
pub mod jobs;
pub mod orchestrator;
pub mod probe;
pub mod relay;

pub use error::{Error, Result};
