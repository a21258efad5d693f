// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! lookout-tests: go test execution and result reconstruction for lookout
//!
//! This library crate runs `go test -json` for a package and rebuilds the
//! nested pass/fail tree of its output, surfacing panics, timeouts and
//! build failures as a run level error.
//!
//! # Example
//!
//! ```
//! use lookout_tests::reconstruct;
//!
//! let raw = r#"{"Time":"2026-01-17T10:00:00Z","Action":"pass","Package":"p","Test":"TestX"}"#;
//! let results = reconstruct(raw);
//! assert!(results.passed());
//! assert_eq!(results.len(), 1);
//! ```

pub mod error;
pub mod event;
pub mod reconstruct;
pub mod result;
pub mod runner;

pub use error::{RunnerError, TestsError};
pub use event::{Action, Event, parse_event};
pub use reconstruct::{Reconstructor, reconstruct};
pub use result::{Results, TestResult};
pub use runner::{Exit, GoRunner, RunFlags, RunOutput, TestRunner};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{RunnerError, TestsError};
    pub use crate::reconstruct::reconstruct;
    pub use crate::result::{Results, TestResult};
    pub use crate::runner::{GoRunner, RunFlags, TestRunner};
}
