// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Test result types
//!
//! Results form a tree of at most three levels: a top-level test, its
//! sub-tests (suite members or `t.Run` calls) and their sub-tests.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use lookout_source::{Test, TestSuite};
use serde::{Deserialize, Serialize};

/// The result of one test or sub-test
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    /// Last segment of the test's path
    pub name: String,
    /// Whether the test passed; skipped tests count as passed
    pub passed: bool,
    /// Whether the test was skipped
    pub skipped: bool,
    /// Whether the test's output reports a panic
    pub panicked: bool,
    /// Whether the race detector reported a data race for this test
    pub raced: bool,
    /// Output lines, verbatim
    pub output: Vec<String>,
    /// Suite initialization log lines (top-level suite results only)
    pub init_output: Vec<String>,
    /// Suite finalization log lines (top-level suite results only)
    pub finalize_output: Vec<String>,
    /// When the test started running
    pub start: Option<DateTime<Utc>>,
    /// When the test finished
    pub end: Option<DateTime<Utc>>,
    /// Seconds the test took, as reported by `go test`
    pub elapsed: Option<f64>,
    /// Sub-test results in first-seen order
    pub children: Vec<TestResult>,
    /// Whether a pass, fail or skip was reported for this test itself
    #[serde(skip)]
    pub(crate) reported: bool,
}

impl TestResult {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Whether the test failed
    #[must_use]
    pub fn failed(&self) -> bool {
        !self.passed
    }

    /// Number of leaf tests at and below this result
    ///
    /// A result with sub-tests is never counted itself.
    #[must_use]
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        if self.is_leaf() {
            1
        } else {
            self.children.iter().map(TestResult::len).sum()
        }
    }

    /// Number of failed leaf tests at and below this result
    #[must_use]
    pub fn len_failed(&self) -> usize {
        if self.is_leaf() {
            usize::from(self.failed())
        } else {
            self.children.iter().map(TestResult::len_failed).sum()
        }
    }

    /// Whether the test has no sub-tests
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Sub-test named `name`
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&TestResult> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Sub-test result of a suite member test
    #[must_use]
    pub fn of_test(&self, test: &Test) -> Option<&TestResult> {
        self.child(&test.name)
    }

    /// Wall time between start and end, if both were reported
    #[must_use]
    pub fn duration(&self) -> Option<Duration> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => (end - start).to_std().ok(),
            _ => None,
        }
    }

    /// Output joined into one string
    #[must_use]
    pub fn output_text(&self) -> String {
        self.output.concat()
    }

    pub(crate) fn child_mut(&mut self, name: &str) -> &mut TestResult {
        let index = match self.children.iter().position(|c| c.name == name) {
            Some(index) => index,
            None => {
                self.children.push(TestResult::new(name));
                self.children.len() - 1
            }
        };
        &mut self.children[index]
    }
}

/// The results of one `go test` run of a package
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Results {
    pub(crate) roots: Vec<TestResult>,
    #[serde(skip)]
    pub(crate) index: HashMap<String, usize>,
    pub(crate) duration: Duration,
    pub(crate) err: String,
    pub(crate) package_output: Vec<String>,
}

impl Results {
    /// Results of a run that produced no usable event stream
    #[must_use]
    pub fn failed(err: impl Into<String>) -> Self {
        Self {
            err: err.into(),
            ..Self::default()
        }
    }

    /// Result of the top-level test named `name`
    #[must_use]
    pub fn of(&self, name: &str) -> Option<&TestResult> {
        self.index.get(name).map(|&i| &self.roots[i])
    }

    /// Result of a plain test
    #[must_use]
    pub fn of_test(&self, test: &Test) -> Option<&TestResult> {
        self.of(&test.name)
    }

    /// Result of a suite, reported under its runner's name
    #[must_use]
    pub fn of_suite(&self, suite: &TestSuite) -> Option<&TestResult> {
        self.of(suite.name())
    }

    /// Top-level results in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = &TestResult> {
        self.roots.iter()
    }

    /// Number of leaf tests
    #[must_use]
    pub fn len(&self) -> usize {
        self.roots.iter().map(TestResult::len).sum()
    }

    /// Whether no test reported anything
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Number of failed leaf tests
    #[must_use]
    pub fn len_failed(&self) -> usize {
        self.roots.iter().map(TestResult::len_failed).sum()
    }

    /// Whether any top-level result failed
    #[must_use]
    pub fn any_failed(&self) -> bool {
        self.roots.iter().any(TestResult::failed)
    }

    /// Process level error; empty if the run itself went fine
    #[must_use]
    pub fn err(&self) -> &str {
        &self.err
    }

    /// Whether there is a process level error
    #[must_use]
    pub fn has_err(&self) -> bool {
        !self.err.is_empty()
    }

    /// Whether the run went fine and no test failed
    #[must_use]
    pub fn passed(&self) -> bool {
        !self.has_err() && !self.any_failed()
    }

    /// Package run time
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Lines not attributable to any test (build output, `ok`, `FAIL`)
    #[must_use]
    pub fn package_output(&self) -> &[String] {
        &self.package_output
    }

    /// Drop every top-level result `keep` rejects.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.roots.retain(|r| keep(&r.name));
        self.reindex();
    }

    pub(crate) fn root_mut(&mut self, name: &str) -> &mut TestResult {
        let index = match self.index.get(name) {
            Some(&index) => index,
            None => {
                self.roots.push(TestResult::new(name));
                let index = self.roots.len() - 1;
                self.index.insert(name.to_string(), index);
                index
            }
        };
        &mut self.roots[index]
    }

    pub(crate) fn reindex(&mut self) {
        self.index = self
            .roots
            .iter()
            .enumerate()
            .map(|(i, r)| (r.name.clone(), i))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lookout_source::Position;

    fn test_named(name: &str) -> Test {
        Test {
            name: name.to_string(),
            position: Position {
                file: 0,
                offset: 0,
                line: 1,
                column: 1,
            },
        }
    }

    #[test]
    fn test_root_lookup_keeps_first_seen_order() {
        let mut results = Results::default();
        results.root_mut("TestB").passed = true;
        results.root_mut("TestA");
        results.root_mut("TestB").output.push("x\n".into());

        let names: Vec<_> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["TestB", "TestA"]);
        assert_eq!(results.of("TestB").map(|r| r.output.len()), Some(1));
        assert_eq!(results.len(), 2);
        assert_eq!(results.len_failed(), 1);
        assert!(!results.passed());
    }

    #[test]
    fn test_of_test_and_children() {
        let mut results = Results::default();
        let root = results.root_mut("TestSuite");
        root.child_mut("Adds").passed = true;
        root.child_mut("Subs");

        let suite = results.of_test(&test_named("TestSuite")).expect("root");
        assert_eq!(suite.len(), 2);
        assert_eq!(suite.len_failed(), 1);
        assert!(!suite.is_leaf());
        assert!(suite.of_test(&test_named("Adds")).is_some_and(|r| r.passed));
        assert!(suite.child("Missing").is_none());
    }

    #[test]
    fn test_counts_recurse_to_leaves() {
        let mut results = Results::default();
        let root = results.root_mut("TestY");
        root.passed = true;
        let sub = root.child_mut("sub1");
        sub.child_mut("a").passed = true;
        sub.child_mut("b");
        root.child_mut("sub2").passed = true;
        results.root_mut("TestZ").passed = true;

        assert_eq!(results.of("TestY").map(TestResult::len), Some(3));
        assert_eq!(results.len(), 4);
        assert_eq!(results.len_failed(), 1);
    }

    #[test]
    fn test_retain_reindexes() {
        let mut results = Results::default();
        results.root_mut("TestA");
        results.root_mut("TestB");
        results.retain(|name| name == "TestB");

        assert_eq!(results.len(), 1);
        assert!(results.of("TestA").is_none());
        assert_eq!(results.of("TestB").map(|r| r.name.as_str()), Some("TestB"));
    }

    #[test]
    fn test_duration_needs_both_ends() {
        let mut result = TestResult::new("TestA");
        assert!(result.duration().is_none());
        let start = Utc::now();
        result.start = Some(start);
        result.end = Some(start + chrono::Duration::milliseconds(250));
        assert_eq!(result.duration(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_failed_results() {
        let results = Results::failed("boom");
        assert!(results.has_err());
        assert!(results.is_empty());
        assert_eq!(results.err(), "boom");
    }
}
