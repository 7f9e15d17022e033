//! Error types for the Nova3D scene engine
//!
//! This module defines the error types used throughout the engine.
//! Structural misuse (dereferencing a removed handle) is not represented
//! here: registries fail fast by panicking, since a stale handle is a
//! programming fault rather than a recoverable runtime condition.

use std::fmt;

/// Result type for Nova3D engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Nova3D engine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Initialization failed (engine, worker pool, subsystems)
    InitializationFailed(String),

    /// One or more task bodies faulted; the frame was abandoned.
    /// Carries the aggregated fault messages of every faulted task.
    FrameFailed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::FrameFailed(msg) => write!(f, "Frame failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
