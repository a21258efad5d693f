//! Error types for lookout-packages

use thiserror::Error;

/// Errors that can occur while locating a module
#[derive(Debug, Error)]
pub enum PackagesError {
    /// Error reading the filesystem
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No `go.mod` in the directory or any of its parents
    #[error("Go module not found from: {path}")]
    ModuleNotFound { path: String },

    /// A `go.mod` without a module directive
    #[error("Invalid module file {path}: {message}")]
    InvalidModuleFile { path: String, message: String },
}
