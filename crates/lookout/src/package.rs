// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Testing packages
//!
//! A [`TestingPackage`] is built for every updated or removed package of
//! a delivered diff. It captures the package's test files once, parses
//! them on first use and keeps the results of its latest run.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use lookout_packages::{Module, PackageStat};
use lookout_packages::scan::TEST_FILE_SUFFIX;
use lookout_source::{Parser, SourceError, SourceFile, Test, TestSet, TestSuite};
use lookout_tests::{Results, RunFlags, TestRunner};
use tracing::debug;

use crate::error::PackageError;

/// What testing packages of one watcher share
#[derive(Debug)]
pub(crate) struct PackageContext {
    pub(crate) module: Module,
    pub(crate) parser: Parser,
    pub(crate) runner: Arc<dyn TestRunner>,
    pub(crate) timeout: Duration,
}

static NO_TESTS: TestSet = TestSet {
    tests: Vec::new(),
    suites: Vec::new(),
};

#[derive(Debug)]
enum ParseState {
    Unparsed,
    Parsed(TestSet),
    Failed(SourceError),
}

/// One package of a diff, with its tests and latest results
#[derive(Debug)]
pub struct TestingPackage {
    id: String,
    abs_path: PathBuf,
    mod_time: Option<DateTime<Utc>>,
    files: Vec<SourceFile>,
    removed: bool,
    parse: ParseState,
    results: Option<Results>,
    context: Arc<PackageContext>,
}

impl TestingPackage {
    /// Package of an updated stat, capturing its test files
    pub(crate) fn updated(stat: &PackageStat, context: Arc<PackageContext>) -> io::Result<Self> {
        let files = read_test_files(&stat.abs_path)?;
        Ok(Self {
            id: stat.id.clone(),
            abs_path: stat.abs_path.clone(),
            mod_time: Some(stat.mod_time),
            files,
            removed: false,
            parse: ParseState::Unparsed,
            results: None,
            context,
        })
    }

    /// Identity-only package of a removed stat
    pub(crate) fn removed(stat: &PackageStat, context: Arc<PackageContext>) -> Self {
        Self {
            id: stat.id.clone(),
            abs_path: stat.abs_path.clone(),
            mod_time: None,
            files: Vec::new(),
            removed: true,
            parse: ParseState::Unparsed,
            results: None,
            context,
        }
    }

    /// Package directory relative to the module root
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Absolute package directory
    #[must_use]
    pub fn abs_path(&self) -> &Path {
        &self.abs_path
    }

    /// Import path of the package
    #[must_use]
    pub fn import_path(&self) -> String {
        self.context.module.import_path(&self.id)
    }

    /// Modification time the package was reported with
    #[must_use]
    pub fn mod_time(&self) -> Option<DateTime<Utc>> {
        self.mod_time
    }

    /// The package's test files, ordered by name
    #[must_use]
    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    /// Whether the package was removed from the module
    #[must_use]
    pub fn is_removed(&self) -> bool {
        self.removed
    }

    /// Plain tests in declaration order
    ///
    /// # Errors
    ///
    /// Returns the `SourceError` of the first broken test file; the error
    /// is kept and returned on every later call.
    pub fn tests(&mut self) -> Result<&[Test], SourceError> {
        Ok(&self.parsed()?.tests)
    }

    /// Suites, the most recently modified last
    ///
    /// # Errors
    ///
    /// See [`TestingPackage::tests`].
    pub fn suites(&mut self) -> Result<&[TestSuite], SourceError> {
        Ok(&self.parsed()?.suites)
    }

    fn parsed(&mut self) -> Result<&TestSet, SourceError> {
        if let ParseState::Unparsed = self.parse {
            self.parse = match self.context.parser.parse(&self.files) {
                Ok(set) => ParseState::Parsed(set),
                Err(e) => {
                    debug!(package = %self.id, error = %e, "test files do not parse");
                    ParseState::Failed(e)
                }
            };
        }
        match &self.parse {
            ParseState::Parsed(set) => Ok(set),
            ParseState::Failed(e) => Err(e.clone()),
            ParseState::Unparsed => Ok(&NO_TESTS),
        }
    }

    /// Run the package's tests and keep the results
    ///
    /// # Errors
    ///
    /// Returns `PackageError::Removed` for a removed package and
    /// `PackageError::Runner` if the test runner could not be run.
    pub async fn run(&mut self, flags: RunFlags) -> Result<&Results, PackageError> {
        if self.removed {
            return Err(PackageError::Removed {
                id: self.id.clone(),
            });
        }
        let output = self
            .context
            .runner
            .run(&self.abs_path, flags, self.context.timeout)
            .await?;
        let results = Results::from_run(&output);
        debug!(
            package = %self.id,
            tests = results.len(),
            failed = results.len_failed(),
            error = results.has_err(),
            "package run finished"
        );
        Ok(self.results.insert(results))
    }

    /// Results of the latest run
    #[must_use]
    pub fn last_results(&self) -> Option<&Results> {
        self.results.as_ref()
    }

    /// Drop tests and suites `results` does not report.
    ///
    /// Results with a process error are ignored; they say nothing about
    /// which tests exist. Unparsed test files are parsed first; a package
    /// whose files do not parse is left untouched.
    pub fn trim_to(&mut self, results: &Results) {
        if results.has_err() || self.parsed().is_err() {
            return;
        }
        if let ParseState::Parsed(set) = &mut self.parse {
            set.retain(|name| results.of(name).is_some());
        }
    }
}

/// Test files of `dir` ordered by name
fn read_test_files(dir: &Path) -> io::Result<Vec<SourceFile>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.ends_with(TEST_FILE_SUFFIX) || !entry.file_type()?.is_file() {
            continue;
        }
        let mod_time = DateTime::<Utc>::from(entry.metadata()?.modified()?);
        let content = fs::read_to_string(entry.path())?;
        files.push(SourceFile {
            name,
            mod_time,
            content,
        });
    }
    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}
