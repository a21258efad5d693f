// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Integration tests for lookout-tests

use std::path::Path;
use std::time::Duration;

use lookout_source::{Parser, SourceFile};
use lookout_tests::{Exit, GoRunner, Results, RunFlags, TestRunner, reconstruct};
use proptest::prelude::*;
use similar_asserts::assert_eq;

/// Output of `go test -json` for a package with a plain test and a suite
const SUITE_RUN: &str = r#"{"Time":"2026-01-17T10:00:00.001+01:00","Action":"start","Package":"example.com/calc"}
{"Time":"2026-01-17T10:00:00.002+01:00","Action":"run","Package":"example.com/calc","Test":"TestAdd"}
{"Time":"2026-01-17T10:00:00.002+01:00","Action":"output","Package":"example.com/calc","Test":"TestAdd","Output":"=== RUN   TestAdd\n"}
{"Time":"2026-01-17T10:00:00.003+01:00","Action":"output","Package":"example.com/calc","Test":"TestAdd","Output":"--- PASS: TestAdd (0.00s)\n"}
{"Time":"2026-01-17T10:00:00.003+01:00","Action":"pass","Package":"example.com/calc","Test":"TestAdd","Elapsed":0}
{"Time":"2026-01-17T10:00:00.004+01:00","Action":"run","Package":"example.com/calc","Test":"TestCalcSuite"}
{"Time":"2026-01-17T10:00:00.004+01:00","Action":"output","Package":"example.com/calc","Test":"TestCalcSuite","Output":"=== RUN   TestCalcSuite\n"}
{"Time":"2026-01-17T10:00:00.005+01:00","Action":"run","Package":"example.com/calc","Test":"TestCalcSuite/Adds_zero"}
{"Time":"2026-01-17T10:00:00.005+01:00","Action":"output","Package":"example.com/calc","Test":"TestCalcSuite/Adds_zero","Output":"=== RUN   TestCalcSuite/Adds_zero\n"}
{"Time":"2026-01-17T10:00:00.005+01:00","Action":"output","Package":"example.com/calc","Test":"TestCalcSuite/Adds_zero","Output":"=== PAUSE TestCalcSuite/Adds_zero\n"}
{"Time":"2026-01-17T10:00:00.005+01:00","Action":"pause","Package":"example.com/calc","Test":"TestCalcSuite/Adds_zero"}
{"Time":"2026-01-17T10:00:00.006+01:00","Action":"run","Package":"example.com/calc","Test":"TestCalcSuite/Subtracts"}
{"Time":"2026-01-17T10:00:00.006+01:00","Action":"cont","Package":"example.com/calc","Test":"TestCalcSuite/Adds_zero"}
{"Time":"2026-01-17T10:00:00.006+01:00","Action":"output","Package":"example.com/calc","Test":"TestCalcSuite/Subtracts","Output":"    calc_test.go:31: want 1, got 2\n"}
{"Time":"2026-01-17T10:00:00.007+01:00","Action":"output","Package":"example.com/calc","Test":"TestCalcSuite/Subtracts","Output":"    --- FAIL: TestCalcSuite/Subtracts (0.00s)\n"}
{"Time":"2026-01-17T10:00:00.007+01:00","Action":"fail","Package":"example.com/calc","Test":"TestCalcSuite/Subtracts","Elapsed":0}
{"Time":"2026-01-17T10:00:00.008+01:00","Action":"pass","Package":"example.com/calc","Test":"TestCalcSuite/Adds_zero","Elapsed":0}
{"Time":"2026-01-17T10:00:00.009+01:00","Action":"fail","Package":"example.com/calc","Test":"TestCalcSuite","Elapsed":0.01}
{"Time":"2026-01-17T10:00:00.010+01:00","Action":"output","Package":"example.com/calc","Output":"FAIL\n"}
{"Time":"2026-01-17T10:00:00.010+01:00","Action":"output","Package":"example.com/calc","Output":"FAIL\texample.com/calc\t0.012s\n"}
{"Time":"2026-01-17T10:00:00.010+01:00","Action":"fail","Package":"example.com/calc","Elapsed":0.012}"#;

const CALC_TEST: &str = r#"package calc

import (
	"testing"

	"github.com/slukits/gounit"
)

func TestAdd(t *testing.T) {}

type calcSuite struct{ gounit.Suite }

func (s *calcSuite) Adds_zero(t *gounit.T) {}

func (s *calcSuite) Subtracts(t *gounit.T) {}

func TestCalcSuite(t *testing.T) { gounit.Run(&calcSuite{}, t) }
"#;

#[test]
fn test_results_line_up_with_parsed_tests() {
    let files = [SourceFile {
        name: "calc_test.go".to_string(),
        mod_time: chrono::Utc::now(),
        content: CALC_TEST.to_string(),
    }];
    let set = Parser::default().parse(&files).expect("Should parse");
    let results = reconstruct(SUITE_RUN);

    assert!(!results.has_err());
    assert_eq!(results.len(), 3);
    assert_eq!(results.len_failed(), 1);
    assert!((results.duration().as_secs_f64() - 0.012).abs() < 1e-6);

    let add = results.of_test(&set.tests[0]).expect("TestAdd");
    assert!(add.passed);
    assert!(add.output.is_empty());

    let suite = &set.suites[0];
    let suite_result = results.of_suite(suite).expect("TestCalcSuite");
    assert!(!suite_result.passed);
    let members: Vec<_> = suite
        .tests
        .iter()
        .map(|t| suite_result.of_test(t).map(|r| r.passed))
        .collect();
    assert_eq!(members, [Some(true), Some(false)]);
    assert_eq!(
        suite_result.of_test(&suite.tests[1]).map(|r| r.output.clone()),
        Some(vec!["    calc_test.go:31: want 1, got 2\n".to_string()])
    );
    assert_eq!(
        results.package_output(),
        ["FAIL\n", "FAIL\texample.com/calc\t0.012s\n"]
    );
}

#[test]
fn test_failing_run_with_failed_test_has_no_process_error() {
    let output = lookout_tests::RunOutput {
        raw: SUITE_RUN.to_string(),
        exit: Exit::Failed(Some(1)),
        timeout: Duration::from_secs(10),
        wall_time: Duration::from_millis(30),
    };
    let results = Results::from_run(&output);
    assert!(!results.has_err());
    assert!((results.duration().as_secs_f64() - 0.012).abs() < 1e-6);
}

fn go_available() -> bool {
    std::process::Command::new("go")
        .arg("version")
        .output()
        .is_ok_and(|o| o.status.success())
}

fn write_module(dir: &Path, test_file: &str) {
    std::fs::write(dir.join("go.mod"), "module example.com/live\n\ngo 1.21\n").expect("go.mod");
    std::fs::write(dir.join("live_test.go"), test_file).expect("test file");
}

#[tokio::test]
async fn test_go_runner_against_toolchain() {
    if !go_available() {
        eprintln!("go not found, skipping");
        return;
    }
    let dir = tempfile::tempdir().expect("tempdir");
    write_module(
        dir.path(),
        r#"package live

import "testing"

func TestPasses(t *testing.T) {
	t.Run("inner", func(t *testing.T) { t.Log("hi") })
}

func TestFails(t *testing.T) { t.Error("nope") }
"#,
    );

    let output = GoRunner::default()
        .run(
            dir.path(),
            RunFlags {
                vet: false,
                race: false,
            },
            Duration::from_secs(60),
        )
        .await
        .expect("Should run");
    assert_eq!(output.exit, Exit::Failed(Some(1)));

    let results = Results::from_run(&output);
    assert!(!results.has_err(), "unexpected error: {}", results.err());
    let passes = results.of("TestPasses").expect("TestPasses");
    assert!(passes.passed);
    assert!(passes.child("inner").is_some_and(|i| i.passed));
    assert!(results.of("TestFails").is_some_and(|f| !f.passed));
}

#[tokio::test]
async fn test_go_runner_build_failure() {
    if !go_available() {
        eprintln!("go not found, skipping");
        return;
    }
    let dir = tempfile::tempdir().expect("tempdir");
    write_module(
        dir.path(),
        "package live\n\nimport \"testing\"\n\nfunc TestBroken(t *testing.T) { undefined() }\n",
    );

    let output = GoRunner::default()
        .run(dir.path(), RunFlags::default(), Duration::from_secs(60))
        .await
        .expect("Should run");
    let results = Results::from_run(&output);
    assert!(results.has_err());
    assert!(results.err().contains("undefined"));
}

fn arb_event() -> impl Strategy<Value = String> {
    let action = prop::sample::select(vec![
        "run", "pause", "cont", "pass", "fail", "skip", "output", "bench", "start",
    ]);
    let path = prop::sample::select(vec![
        "", "TestA", "TestA/x", "TestA/x/y", "TestB", "TestB/z", "TestA/x/y/w",
    ]);
    let output = prop::sample::select(vec![
        "=== RUN   TestA\n",
        "plain\n",
        "panic: boom\n",
        "WARNING: DATA RACE\n",
        "    x.go:1: __suite_init__: up\n",
    ]);
    (action, path, output).prop_map(|(action, path, output)| {
        let mut event = serde_json::json!({
            "Time": "2026-01-17T10:00:00Z",
            "Action": action,
            "Package": "p",
        });
        if !path.is_empty() {
            event["Test"] = path.into();
        }
        if action == "output" {
            event["Output"] = output.into();
        }
        event.to_string()
    })
}

proptest! {
    #[test]
    fn prop_reconstruct_counts_are_consistent(events in prop::collection::vec(arb_event(), 0..60)) {
        let raw = events.join("\n");
        let results = reconstruct(&raw);
        prop_assert!(results.len_failed() <= results.len());
        for root in results.iter() {
            prop_assert!(root.len() >= 1);
            prop_assert!(root.children.len() <= root.len());
        }
        let panicked = results.iter().any(|r| {
            r.panicked || r.children.iter().any(|c| c.panicked || c.children.iter().any(|g| g.panicked))
        });
        prop_assert_eq!(panicked, results.err().starts_with("panic: "));
    }

    #[test]
    fn prop_reconstruct_never_panics_on_text(raw in ".{0,400}") {
        let _ = reconstruct(&raw);
    }
}
