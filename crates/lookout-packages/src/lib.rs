// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! lookout-packages: Go module scanning for lookout
//!
//! This library crate finds the Go module a directory belongs to, takes
//! snapshots of the module's testing packages and diffs snapshots into
//! updated and removed packages.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use lookout_packages::{Module, PackageSnapshot, Scanner, diff};
//!
//! let module = Module::find(Path::new(".")).unwrap();
//! let mut scanner = Scanner::with_defaults(module.root());
//! let current = Arc::new(scanner.scan());
//! if let Some(d) = diff(&current, &Arc::new(PackageSnapshot::default())) {
//!     for stat in d.updated() {
//!         println!("{}", module.import_path(&stat.id));
//!     }
//! }
//! ```

pub mod diff;
pub mod error;
pub mod module;
pub mod scan;
pub mod snapshot;

pub use diff::{PackagesDiff, diff};
pub use error::PackagesError;
pub use module::Module;
pub use scan::{DEFAULT_IGNORED, Scanner};
pub use snapshot::{PackageSnapshot, PackageStat};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::diff::{PackagesDiff, diff};
    pub use crate::error::PackagesError;
    pub use crate::module::Module;
    pub use crate::scan::Scanner;
    pub use crate::snapshot::{PackageSnapshot, PackageStat};
}
