// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Error types for lookout

use lookout_packages::PackagesError;
use lookout_tests::RunnerError;
use thiserror::Error;

/// Errors starting or talking to a watcher
#[derive(Debug, Error)]
pub enum WatchError {
    /// No `go.mod` found walking upward from the watched directory
    #[error("no Go module found from: {path}")]
    ModuleNotFound {
        /// The watched directory
        path: String,
    },

    /// The module could not be read
    #[error(transparent)]
    Packages(PackagesError),

    /// The watcher loop is gone
    #[error("watcher stopped")]
    Stopped,
}

impl From<PackagesError> for WatchError {
    fn from(err: PackagesError) -> Self {
        match err {
            PackagesError::ModuleNotFound { path } => Self::ModuleNotFound { path },
            other => Self::Packages(other),
        }
    }
}

/// Errors running a testing package
#[derive(Debug, Error)]
pub enum PackageError {
    /// The package no longer exists
    #[error("package {id} was removed")]
    Removed {
        /// Package id
        id: String,
    },

    /// The test runner failed
    #[error(transparent)]
    Runner(#[from] RunnerError),
}
