//! Per-package run reports

use lookout_tests::{Results, TestResult};
use serde::Serialize;

/// Summary of one package run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// Import path of the package
    pub package: String,
    /// Whether the run went fine and every test passed
    pub passed: bool,
    /// Number of leaf tests
    pub tests: usize,
    /// Number of failed leaf tests
    pub failed: usize,
    /// `/` separated paths of the failed tests
    pub failures: Vec<String>,
    /// Run time in milliseconds
    pub duration_ms: u128,
    /// Process level error, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Report {
    /// Summarize the results of `package`
    #[must_use]
    pub fn new(package: impl Into<String>, results: &Results) -> Self {
        Self {
            package: package.into(),
            passed: results.passed(),
            tests: results.len(),
            failed: results.len_failed(),
            failures: failed_paths(results),
            duration_ms: results.duration().as_millis(),
            error: results.has_err().then(|| results.err().to_string()),
        }
    }
}

/// Paths of failed leaves and of failed tests whose sub-tests all passed
#[must_use]
pub fn failed_paths(results: &Results) -> Vec<String> {
    let mut paths = Vec::new();
    for root in results.iter() {
        collect(root, root.name.clone(), &mut paths);
    }
    paths
}

fn collect(node: &TestResult, path: String, paths: &mut Vec<String>) {
    if node.passed {
        return;
    }
    let before = paths.len();
    for child in &node.children {
        collect(child, format!("{path}/{}", child.name), paths);
    }
    if paths.len() == before {
        paths.push(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lookout_tests::reconstruct;
    use similar_asserts::assert_eq;

    const RUN: &str = r#"{"Time":"2026-01-17T10:00:00Z","Action":"pass","Package":"p","Test":"TestOk"}
{"Time":"2026-01-17T10:00:00Z","Action":"pass","Package":"p","Test":"TestS/A"}
{"Time":"2026-01-17T10:00:00Z","Action":"fail","Package":"p","Test":"TestS/B"}
{"Time":"2026-01-17T10:00:00Z","Action":"fail","Package":"p","Test":"TestS"}
{"Time":"2026-01-17T10:00:00Z","Action":"pass","Package":"p","Test":"TestCleanup/A"}
{"Time":"2026-01-17T10:00:00Z","Action":"fail","Package":"p","Test":"TestCleanup"}
{"Time":"2026-01-17T10:00:00Z","Action":"fail","Package":"p","Elapsed":0.25}"#;

    #[test]
    fn test_report_of_failing_run() {
        let report = Report::new("example.com/p", &reconstruct(RUN));
        assert!(!report.passed);
        assert_eq!(report.tests, 4);
        assert_eq!(report.failed, 1);
        assert_eq!(report.failures, ["TestS/B", "TestCleanup"]);
        assert_eq!(report.duration_ms, 250);
        assert!(report.error.is_none());
    }

    #[test]
    fn test_report_json() {
        let report = Report::new("example.com/p", &Results::failed("shell exit: exit status 2\n"));
        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["package"], "example.com/p");
        assert_eq!(json["passed"], false);
        assert_eq!(json["error"], "shell exit: exit status 2\n");

        let passing = Report::new("example.com/q", &reconstruct(
            r#"{"Time":"2026-01-17T10:00:00Z","Action":"pass","Package":"q","Test":"TestX"}"#,
        ));
        let json = serde_json::to_value(&passing).expect("serialize");
        assert!(json.get("error").is_none());
        assert_eq!(json["tests"], 1);
    }
}
