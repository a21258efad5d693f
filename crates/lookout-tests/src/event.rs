//! `go test -json` events
//!
//! One JSON object per line, as emitted by `go test -json` (see
//! `go doc test2json`):
//!
//! ```text
//! {"Time":"2026-01-17T10:00:00.1+01:00","Action":"run","Package":"example.com/p","Test":"TestA"}
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TestsError;

/// Field names every structured stream mentions
pub const REQUIRED_FIELDS: &[&str] = &["\"Time\"", "\"Action\"", "\"Package\""];

/// What happened to a test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// The package's test binary started
    Start,
    /// A test began running
    Run,
    /// A test was paused (`t.Parallel`)
    Pause,
    /// A paused test continued
    Cont,
    /// A test passed
    Pass,
    /// A test failed
    Fail,
    /// A benchmark printed its result
    Bench,
    /// A test printed output
    Output,
    /// A test was skipped
    Skip,
    /// The compiler printed output while building the test binary
    #[serde(rename = "build-output")]
    BuildOutput,
    /// Building the test binary failed
    #[serde(rename = "build-fail")]
    BuildFail,
    /// Actions of newer toolchains this crate does not know
    #[serde(other)]
    Other,
}

/// A single event of the stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Event {
    /// When the event happened
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
    /// Event kind
    pub action: Action,
    /// Import path of the package under test
    #[serde(default)]
    pub package: String,
    /// `/` separated test path; empty for package-level events
    #[serde(default)]
    pub test: String,
    /// Seconds the test (or package) took, on pass and fail
    #[serde(default)]
    pub elapsed: Option<f64>,
    /// Printed text, on output events
    #[serde(default)]
    pub output: String,
    /// Set on a package's fail event if its test binary did not build
    #[serde(default)]
    pub failed_build: Option<String>,
}

impl Event {
    /// Whether the event concerns the package rather than a test
    #[must_use]
    pub fn is_package_level(&self) -> bool {
        self.test.is_empty()
    }
}

/// Parse a single event line
///
/// # Errors
///
/// Returns `TestsError::JsonParse` if the JSON is invalid.
pub fn parse_event(line: &str) -> Result<Event, TestsError> {
    serde_json::from_str(line).map_err(TestsError::from)
}

/// Whether `raw` can be a structured stream at all
#[must_use]
pub fn is_structured(raw: &str) -> bool {
    REQUIRED_FIELDS.iter().all(|field| raw.contains(field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use similar_asserts::assert_eq;

    #[test]
    fn test_parse_run_event() {
        let event = parse_event(
            r#"{"Time":"2026-01-17T10:00:00.5+01:00","Action":"run","Package":"example.com/p","Test":"TestA"}"#,
        )
        .expect("Should parse");
        assert_eq!(event.action, Action::Run);
        assert_eq!(event.test, "TestA");
        assert_eq!(
            event.time,
            Some(Utc.with_ymd_and_hms(2026, 1, 17, 9, 0, 0).unwrap() + chrono::Duration::milliseconds(500))
        );
        assert!(event.elapsed.is_none());
    }

    #[test]
    fn test_parse_package_event() {
        let event = parse_event(
            r#"{"Time":"2026-01-17T10:00:01Z","Action":"pass","Package":"example.com/p","Elapsed":0.012}"#,
        )
        .expect("Should parse");
        assert!(event.is_package_level());
        assert_eq!(event.elapsed, Some(0.012));
    }

    #[test]
    fn test_parse_build_output() {
        let event = parse_event(
            r##"{"ImportPath":"example.com/p","Action":"build-output","Output":"# example.com/p\n"}"##,
        )
        .expect("Should parse");
        assert_eq!(event.action, Action::BuildOutput);
        assert!(event.is_package_level());
        assert_eq!(event.output, "# example.com/p\n");
    }

    #[test]
    fn test_parse_failed_build() {
        let event = parse_event(
            r#"{"Time":"2026-01-17T10:00:01Z","Action":"fail","Package":"example.com/p","Elapsed":0,"FailedBuild":"example.com/p [example.com/p.test]"}"#,
        )
        .expect("Should parse");
        assert_eq!(event.action, Action::Fail);
        assert_eq!(
            event.failed_build.as_deref(),
            Some("example.com/p [example.com/p.test]")
        );
    }

    #[test]
    fn test_unknown_action_and_fields() {
        let event = parse_event(r#"{"ImportPath":"example.com/p","Action":"attr","Key":"k"}"#)
            .expect("Should parse");
        assert_eq!(event.action, Action::Other);
    }

    #[test]
    fn test_parse_invalid_json() {
        assert!(parse_event("not json").is_err());
        assert!(parse_event(r#"{"Test":"TestA"}"#).is_err());
    }

    #[test]
    fn test_is_structured() {
        assert!(is_structured(
            r#"{"Time":"2026-01-17T10:00:01Z","Action":"start","Package":"p"}"#
        ));
        assert!(!is_structured("# example.com/p\n./p.go:3:1: syntax error"));
        assert!(!is_structured(r#"{"Time":"x","Package":"p"}"#));
    }
}
