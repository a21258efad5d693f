// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Result reconstruction from `go test -json` output
//!
//! Events arrive interleaved across tests (`t.Parallel`) and nested by
//! `/` separated paths. [`Reconstructor`] folds them into a [`Results`]
//! tree; [`reconstruct`] does so for a complete run.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::TestsError;
use crate::event::{Action, Event, is_structured, parse_event};
use crate::result::{Results, TestResult};

/// Marks a suite's initialization log line
pub const INIT_MARKER: &str = "__suite_init__: ";

/// Marks a suite's finalization log line
pub const FINALIZE_MARKER: &str = "__suite_finalize__: ";

/// Output start reporting a panic
pub const PANIC_PREFIX: &str = "panic:";

/// Output the race detector prints for every detected race
pub const RACE_SENTINEL: &str = "WARNING: DATA RACE";

/// Framework lines that repeat what the events already say
const NO_OP_PREFIXES: &[&str] = &[
    "=== RUN",
    "=== PAUSE",
    "=== CONT",
    "=== NAME",
    "--- PASS",
    "--- FAIL",
    "--- SKIP",
];

/// Maximum depth of the results tree
const MAX_DEPTH: usize = 3;

/// Reconstruct the results of a complete `go test -json` run.
///
/// Output that is not a structured stream, or carries a line that fails
/// to decode, becomes the process error verbatim.
#[must_use]
pub fn reconstruct(raw: &str) -> Results {
    if !is_structured(raw) {
        return Results::failed(raw);
    }
    let mut reconstructor = Reconstructor::new();
    for line in raw.lines() {
        if let Err(e) = reconstructor.process_line(line) {
            debug!(error = %e, "undecodable event, keeping raw output");
            return Results::failed(raw);
        }
    }
    reconstructor.finish()
}

/// Incremental results reconstruction
#[derive(Debug, Default)]
pub struct Reconstructor {
    results: Results,
}

impl Reconstructor {
    /// Create a new reconstructor
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a single line of output
    ///
    /// Lines that are not JSON objects are kept as package output.
    ///
    /// # Errors
    ///
    /// Returns `TestsError::JsonParse` if a JSON line does not decode
    /// into an event.
    pub fn process_line(&mut self, line: &str) -> Result<(), TestsError> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(());
        }
        if !trimmed.starts_with('{') {
            self.results.package_output.push(format!("{line}\n"));
            return Ok(());
        }
        let event = parse_event(trimmed)?;
        self.process_event(event);
        Ok(())
    }

    /// Fold a single event into the results
    pub fn process_event(&mut self, event: Event) {
        if event.is_package_level() {
            self.package_event(event);
            return;
        }
        match event.action {
            Action::Output => self.output(&event.test, &event.output),
            Action::Run => {
                let node = self.node_mut(&event.test);
                node.start = earliest(node.start, event.time);
            }
            Action::Pass => {
                let node = self.node_mut(&event.test);
                if !node.raced {
                    node.passed = true;
                }
                finish_node(node, &event);
            }
            Action::Fail => {
                let node = self.node_mut(&event.test);
                node.passed = false;
                finish_node(node, &event);
            }
            Action::Skip => {
                let node = self.node_mut(&event.test);
                node.passed = true;
                node.skipped = true;
                finish_node(node, &event);
            }
            Action::Start
            | Action::Pause
            | Action::Cont
            | Action::Bench
            | Action::BuildOutput
            | Action::BuildFail
            | Action::Other => {}
        }
    }

    /// Settle unreported parents and search for panics
    #[must_use]
    pub fn finish(mut self) -> Results {
        for root in &mut self.results.roots {
            settle(root);
        }
        if let Some(node) = self.results.roots.iter().find_map(find_panic) {
            self.results.err = format!("{PANIC_PREFIX} {}\n{}", node.name, node.output_text());
        }
        self.results
    }

    fn package_event(&mut self, event: Event) {
        match event.action {
            Action::Output | Action::BuildOutput => {
                self.results.package_output.push(event.output);
            }
            Action::Pass | Action::Fail => {
                if let Some(build) = event.failed_build {
                    debug!(%build, "test binary failed to build");
                }
                if let Some(elapsed) = event.elapsed.filter(|e| e.is_finite() && *e >= 0.0) {
                    self.results.duration = std::time::Duration::from_secs_f64(elapsed);
                }
            }
            _ => {}
        }
    }

    fn output(&mut self, path: &str, output: &str) {
        let root = path.split('/').next().unwrap_or(path);
        if let Some((_, log)) = output.split_once(INIT_MARKER) {
            self.results.root_mut(root).init_output.push(log.to_string());
            return;
        }
        if let Some((_, log)) = output.split_once(FINALIZE_MARKER) {
            self.results.root_mut(root).finalize_output.push(log.to_string());
            return;
        }
        if is_no_op(output) {
            // still creates the node so that first-seen order holds
            self.node_mut(path);
            return;
        }

        let node = self.node_mut(path);
        if output.starts_with(PANIC_PREFIX) && !node.panicked {
            node.panicked = true;
        }
        if output.contains(RACE_SENTINEL) {
            node.raced = true;
            node.passed = false;
        }
        node.output.push(output.to_string());
    }

    fn node_mut(&mut self, path: &str) -> &mut TestResult {
        let mut segments = path.splitn(MAX_DEPTH, '/');
        let root = segments.next().unwrap_or(path);
        segments.fold(self.results.root_mut(root), |node, name| node.child_mut(name))
    }
}

fn finish_node(node: &mut TestResult, event: &Event) {
    node.reported = true;
    if event.time.is_some() {
        node.end = event.time;
    }
    if event.elapsed.is_some() {
        node.elapsed = event.elapsed;
    }
}

fn earliest(current: Option<DateTime<Utc>>, time: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match (current, time) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn is_no_op(output: &str) -> bool {
    let output = output.trim_start();
    NO_OP_PREFIXES.iter().any(|prefix| output.starts_with(prefix))
}

/// Parents without an event of their own pass if all their children do.
fn settle(node: &mut TestResult) {
    for child in &mut node.children {
        settle(child);
    }
    if !node.children.is_empty() && !node.reported {
        node.passed = node.children.iter().all(|c| c.passed);
    }
}

fn find_panic(node: &TestResult) -> Option<&TestResult> {
    if node.panicked {
        return Some(node);
    }
    node.children.iter().find_map(find_panic)
}
