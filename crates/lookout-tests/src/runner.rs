// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Running `go test`
//!
//! [`TestRunner`] is the seam between the watcher and the Go toolchain;
//! [`GoRunner`] is the implementation that shells out to `go`.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::RunnerError;
use crate::reconstruct::reconstruct;
use crate::result::Results;

/// Extra time the runner gets to stop on its own `-timeout`
pub const GRACE_PERIOD: Duration = Duration::from_secs(2);

/// Process error prefix of a run that did not finish in time
pub const TIMEOUT_PREFIX: &str = "timeout: ";

/// Time the output pipes get to drain after the runner was killed
const DRAIN_PERIOD: Duration = Duration::from_millis(200);

/// Output start of `go test` stopping itself on `-timeout`
pub const SELF_TIMEOUT_PANIC: &str = "panic: test timed out after";

/// Process error prefix of a run that failed without a failing test
pub const SHELL_EXIT_PREFIX: &str = "shell exit: ";

/// Flags a package's tests are run with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunFlags {
    /// Run `go vet` as part of `go test`
    pub vet: bool,
    /// Enable the race detector
    pub race: bool,
}

impl Default for RunFlags {
    fn default() -> Self {
        Self {
            vet: true,
            race: false,
        }
    }
}

impl RunFlags {
    /// Command line flags for `go test`
    #[must_use]
    pub fn args(&self) -> Vec<&'static str> {
        let mut args = Vec::new();
        if !self.vet {
            args.push("-vet=off");
        }
        if self.race {
            args.push("-race");
        }
        args
    }
}

/// How the runner process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Exit {
    /// Zero exit status
    Success,
    /// Non-zero exit status; `None` if killed by a signal
    Failed(Option<i32>),
    /// The runner did not finish within timeout and grace period
    TimedOut,
}

/// Everything a run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    /// stdout followed by stderr
    pub raw: String,
    /// How the process ended
    pub exit: Exit,
    /// The timeout the run was given
    pub timeout: Duration,
    /// Measured wall time
    pub wall_time: Duration,
}

/// Runs the tests of one Go package
#[async_trait]
pub trait TestRunner: Send + Sync + std::fmt::Debug {
    /// Run the tests of the package in `dir`.
    ///
    /// # Errors
    ///
    /// Returns a `RunnerError` only if the runner could not be started or
    /// awaited. Failing tests and abnormal exits are reported in the
    /// returned output.
    async fn run(
        &self,
        dir: &Path,
        flags: RunFlags,
        timeout: Duration,
    ) -> Result<RunOutput, RunnerError>;
}

/// [`TestRunner`] invoking `go test -json`
#[derive(Debug, Clone)]
pub struct GoRunner {
    binary: PathBuf,
    grace: Duration,
}

impl Default for GoRunner {
    fn default() -> Self {
        Self::new("go")
    }
}

impl GoRunner {
    /// Create a runner using the given `go` binary
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            grace: GRACE_PERIOD,
        }
    }

    /// Override the grace period
    #[must_use]
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    fn command(&self, dir: &Path, flags: RunFlags, timeout: Duration) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("test")
            .arg("-json")
            .arg(format!("-timeout={}ms", timeout.as_millis()))
            .args(flags.args())
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl TestRunner for GoRunner {
    async fn run(
        &self,
        dir: &Path,
        flags: RunFlags,
        timeout: Duration,
    ) -> Result<RunOutput, RunnerError> {
        let binary = self.binary.display().to_string();
        debug!(dir = %dir.display(), ?flags, ?timeout, "running go test");

        let started = Instant::now();
        let mut child = self
            .command(dir, flags, timeout)
            .spawn()
            .map_err(|source| RunnerError::Spawn {
                binary: binary.clone(),
                source,
            })?;
        let (stdout, mut stdout_reader) = capture(child.stdout.take());
        let (stderr, mut stderr_reader) = capture(child.stderr.take());

        let exit = match tokio::time::timeout(timeout + self.grace, child.wait()).await {
            Ok(status) => {
                let status = status.map_err(|source| RunnerError::Wait { binary, source })?;
                let _ = tokio::join!(&mut stdout_reader, &mut stderr_reader);
                if status.success() {
                    Exit::Success
                } else {
                    Exit::Failed(status.code())
                }
            }
            Err(_) => {
                debug!(dir = %dir.display(), "go test timed out, killing it");
                if let Err(e) = child.kill().await {
                    debug!(error = %e, "could not kill go test");
                }
                // grandchildren may still hold the pipes open
                let drained = async { tokio::join!(&mut stdout_reader, &mut stderr_reader) };
                if tokio::time::timeout(DRAIN_PERIOD, drained).await.is_err() {
                    stdout_reader.abort();
                    stderr_reader.abort();
                }
                Exit::TimedOut
            }
        };

        let mut raw = take_lossy(&stdout);
        raw.push_str(&take_lossy(&stderr));
        debug!(dir = %dir.display(), ?exit, "go test finished");

        Ok(RunOutput {
            raw,
            exit,
            timeout,
            wall_time: started.elapsed(),
        })
    }
}

type Captured = Arc<Mutex<Vec<u8>>>;

/// Read `pipe` to its end in the background, keeping what was read so far
/// in the returned buffer.
fn capture<R>(pipe: Option<R>) -> (Captured, JoinHandle<()>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let buffer = Captured::default();
    let sink = Arc::clone(&buffer);
    let reader = tokio::spawn(async move {
        let Some(mut pipe) = pipe else {
            return;
        };
        let mut chunk = [0u8; 8192];
        loop {
            match pipe.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => sink
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .extend_from_slice(&chunk[..n]),
                Err(e) => {
                    debug!(error = %e, "reading go test output failed");
                    break;
                }
            }
        }
    });
    (buffer, reader)
}

fn take_lossy(buffer: &Captured) -> String {
    let bytes = std::mem::take(&mut *buffer.lock().unwrap_or_else(PoisonError::into_inner));
    String::from_utf8_lossy(&bytes).into_owned()
}

impl Results {
    /// Reconstruct the results of a run, folding in how it ended.
    #[must_use]
    pub fn from_run(output: &RunOutput) -> Self {
        let mut results = reconstruct(&output.raw);
        match output.exit {
            Exit::TimedOut => {
                results.err = format!(
                    "{TIMEOUT_PREFIX}no results within {}ms",
                    output.timeout.as_millis()
                );
            }
            Exit::Failed(_) if output.raw.contains(SELF_TIMEOUT_PANIC) => {
                let detail = if results.has_err() {
                    results.err.clone()
                } else {
                    results.package_output.concat()
                };
                results.err = format!("{TIMEOUT_PREFIX}{detail}");
            }
            Exit::Failed(code) if !results.has_err() && !results.any_failed() => {
                let status = code.map_or_else(|| "signal".to_string(), |c| c.to_string());
                let detail = if results.package_output.is_empty() {
                    output.raw.clone()
                } else {
                    results.package_output.concat()
                };
                results.err = format!("{SHELL_EXIT_PREFIX}exit status {status}\n{detail}");
            }
            Exit::Success | Exit::Failed(_) => {}
        }
        if results.duration.is_zero() {
            results.duration = output.wall_time;
        }
        results
    }
}
