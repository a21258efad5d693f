// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Error types for lookout-tests

use thiserror::Error;

/// Errors that can occur while decoding the test event stream
#[derive(Debug, Error)]
pub enum TestsError {
    /// Error parsing JSON
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Invalid event stream format
    #[error("Invalid event stream format: {message}")]
    InvalidFormat {
        /// Description of the format error
        message: String,
    },
}

/// Errors running the test binary itself
///
/// Failing tests and abnormal exits are not errors; they end up in
/// [`crate::Results`].
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The runner could not be started
    #[error("failed to run {binary}: {source}")]
    Spawn {
        /// The binary that was invoked
        binary: String,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Waiting for the runner failed
    #[error("failed to wait for {binary}: {source}")]
    Wait {
        /// The binary that was invoked
        binary: String,
        /// Underlying IO error
        source: std::io::Error,
    },
}
