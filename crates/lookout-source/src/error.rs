// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Error types for lookout-source

use thiserror::Error;

/// Errors that can occur while scanning Go test sources
///
/// Errors are `Clone` because a package caches the first one it produced
/// and hands it out on every later query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// The file does not start with a `package` clause
    #[error("{file}: expected package clause")]
    MissingPackage {
        /// Name of the offending file
        file: String,
    },

    /// Malformed source text at a known location
    #[error("{file}:{line}:{column}: {message}")]
    Syntax {
        /// Name of the offending file
        file: String,
        /// 1-based line of the error
        line: usize,
        /// 1-based byte column of the error
        column: usize,
        /// Description of the problem
        message: String,
    },
}

impl SourceError {
    /// Name of the file the error was found in
    #[must_use]
    pub fn file(&self) -> &str {
        match self {
            Self::MissingPackage { file } | Self::Syntax { file, .. } => file,
        }
    }
}
