// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! lookout-source: Go test source scanning for lookout
//!
//! This library crate reads the `*_test.go` files of a Go package and
//! reports, in declaration order, the test functions, suite runners and
//! suite member tests they declare.

//! # Example
//!
//! ```
//! use chrono::Utc;
//! use lookout_source::{Parser, SourceFile};
//!
//! let file = SourceFile {
//!     name: "x_test.go".to_string(),
//!     mod_time: Utc::now(),
//!     content: "package x\nfunc TestX(t *testing.T) {}\n".to_string(),
//! };
//! let set = Parser::default().parse(&[file]).expect("parse");
//! assert_eq!(set.tests[0].name, "TestX");
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod lexer;
pub mod parser;
pub mod suite;
pub mod syntax;

pub use error::SourceError;
pub use parser::{Parser, Position, SourceFile, Test, TestSet, TestSuite, has_test_function};
pub use suite::SuiteFramework;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::SourceError;
    pub use crate::parser::{Parser, SourceFile, Test, TestSet, TestSuite};
    pub use crate::suite::SuiteFramework;
}
