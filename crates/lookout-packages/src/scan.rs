// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Module scanning
//!
//! A directory is a testing package if one of its `*_test.go` files
//! declares a `Test*` function. Directories are walked with an explicit
//! stack; a directory that cannot be read is skipped together with
//! everything below it, an entry that cannot be stat'ed only by itself.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use lookout_source::has_test_function;
use tracing::{debug, warn};

use crate::module::{MODULE_FILE, package_id};
use crate::snapshot::{PackageSnapshot, PackageStat};

/// Directory names never descended into
pub const DEFAULT_IGNORED: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    ".bzr",
    "node_modules",
    "vendor",
    "testdata",
];

/// Suffix of Go source files
pub const GO_SUFFIX: &str = ".go";

/// Suffix of Go test files
pub const TEST_FILE_SUFFIX: &str = "_test.go";

/// Produces package snapshots of one module
///
/// Remembers for every test file whether it declares a test, so files
/// are only re-read when their modification time changes.
#[derive(Debug)]
pub struct Scanner {
    root: PathBuf,
    ignored: Vec<String>,
    verdicts: HashMap<PathBuf, (SystemTime, bool)>,
}

impl Scanner {
    /// Create a scanner for the module rooted at `root`
    pub fn new(root: impl Into<PathBuf>, ignored: impl IntoIterator<Item = String>) -> Self {
        Self {
            root: root.into(),
            ignored: ignored.into_iter().collect(),
            verdicts: HashMap::new(),
        }
    }

    /// Create a scanner ignoring the [`DEFAULT_IGNORED`] directories
    pub fn with_defaults(root: impl Into<PathBuf>) -> Self {
        Self::new(root, DEFAULT_IGNORED.iter().map(ToString::to_string))
    }

    /// Module root being scanned
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether a directory named `name` is skipped
    ///
    /// Like the go tool, directories starting with `.` or `_` are
    /// skipped as well.
    #[must_use]
    pub fn is_ignored(&self, name: &str) -> bool {
        name.starts_with('.') || name.starts_with('_') || self.ignored.iter().any(|i| i == name)
    }

    /// Take a snapshot of the module's testing packages
    pub fn scan(&mut self) -> PackageSnapshot {
        let mut stack = vec![self.root.clone()];
        let mut seen = HashSet::new();
        let mut packages = Vec::new();

        while let Some(dir) = stack.pop() {
            match self.visit(&dir, &mut stack, &mut seen) {
                Ok(Some(mod_time)) => {
                    if let Some(id) = package_id(&self.root, &dir) {
                        packages.push(PackageStat {
                            id,
                            abs_path: dir,
                            mod_time,
                        });
                    }
                }
                Ok(None) => {}
                Err(e) => debug!(dir = %dir.display(), error = %e, "skipping directory"),
            }
        }

        self.verdicts.retain(|path, _| seen.contains(path));
        debug!(root = %self.root.display(), packages = packages.len(), "scanned module");
        PackageSnapshot::new(packages)
    }

    /// Push `dir`'s sub-directories and return its modification time if
    /// it is a testing package.
    ///
    /// Entries that fail to stat are skipped on their own; only an
    /// unreadable `dir` fails the visit.
    fn visit(
        &mut self,
        dir: &Path,
        stack: &mut Vec<PathBuf>,
        seen: &mut HashSet<PathBuf>,
    ) -> io::Result<Option<DateTime<Utc>>> {
        let mut listing = Listing::default();

        for entry in fs::read_dir(dir)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!(dir = %dir.display(), error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            match self.visit_entry(dir, &entry, &mut listing, seen) {
                Ok(Entry::NestedModule) => {
                    debug!(dir = %dir.display(), "skipping nested module");
                    return Ok(None);
                }
                Ok(Entry::Other) => {}
                Err(e) => {
                    debug!(entry = %entry.path().display(), error = %e, "skipping entry");
                }
            }
        }

        stack.extend(listing.subdirs);
        Ok(listing
            .latest
            .filter(|_| listing.has_test)
            .map(DateTime::<Utc>::from))
    }

    fn visit_entry(
        &mut self,
        dir: &Path,
        entry: &fs::DirEntry,
        listing: &mut Listing,
        seen: &mut HashSet<PathBuf>,
    ) -> io::Result<Entry> {
        let file_type = entry.file_type()?;
        let name = entry.file_name();
        let name = name.to_string_lossy();

        if file_type.is_dir() {
            if !self.is_ignored(&name) {
                listing.subdirs.push(entry.path());
            }
            return Ok(Entry::Other);
        }
        if file_type.is_file() && name == MODULE_FILE && dir != self.root {
            return Ok(Entry::NestedModule);
        }
        if !name.ends_with(GO_SUFFIX) {
            return Ok(Entry::Other);
        }

        // symlinked files count, symlinked directories are not followed
        let metadata = if file_type.is_symlink() {
            fs::metadata(entry.path())?
        } else {
            entry.metadata()?
        };
        if !metadata.is_file() {
            return Ok(Entry::Other);
        }
        let modified = metadata.modified()?;
        listing.latest = listing.latest.max(Some(modified));
        if name.ends_with(TEST_FILE_SUFFIX) {
            let path = entry.path();
            listing.has_test |= self.declares_test(&path, modified);
            seen.insert(path);
        }
        Ok(Entry::Other)
    }

    fn declares_test(&mut self, path: &Path, modified: SystemTime) -> bool {
        if let Some(&(time, verdict)) = self.verdicts.get(path)
            && time == modified
        {
            return verdict;
        }
        match fs::read_to_string(path) {
            Ok(content) => {
                let verdict = has_test_function(&content);
                self.verdicts.insert(path.to_path_buf(), (modified, verdict));
                verdict
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "unreadable test file");
                false
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn remembered(&self) -> usize {
        self.verdicts.len()
    }
}

/// What a directory visit collected
#[derive(Debug, Default)]
struct Listing {
    subdirs: Vec<PathBuf>,
    latest: Option<SystemTime>,
    has_test: bool,
}

enum Entry {
    NestedModule,
    Other,
}
