// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! lookout: rerun the tests of changed Go packages
//!
//! This library crate watches a Go module, delivers diffs of its testing
//! packages to subscribers and runs a package's tests on demand.
//!
//! # Example
//!
//! ```no_run
//! use lookout::{Watcher, WatcherConfig};
//! use lookout_tests::RunFlags;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let watcher = Watcher::new(WatcherConfig::default());
//! let (mut diffs, _id) = watcher.watch().await?;
//! while let Some(diff) = diffs.recv().await {
//!     for mut package in diff.updated() {
//!         let failed = package.run(RunFlags::default()).await?.len_failed();
//!         println!("{}: {failed} failed", package.id());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod diff;
pub mod error;
pub mod package;
pub mod report;
pub mod slot;
pub mod watcher;

pub use diff::Diff;
pub use error::{PackageError, WatchError};
pub use package::TestingPackage;
pub use report::Report;
pub use watcher::{DiffStream, SubscriberId, Watcher, WatcherConfig};
