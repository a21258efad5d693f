// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! lookout: rerun the tests of changed Go packages
//!
//! Watches the Go module containing the configured directory and runs
//! the tests of every package that changes, logging the outcome.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use lookout::config::Config;
use lookout::{Diff, Report, TestingPackage, Watcher};
use lookout_tests::RunFlags;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

fn main() -> Result<()> {
    let config = Config::parse();

    // Logs go to stderr; --json reports own stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(config.log_level().into()),
        )
        .with_writer(std::io::stderr)
        .init();

    config.validate()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;
    runtime.block_on(watch(config))
}

async fn watch(config: Config) -> Result<()> {
    let watcher = Arc::new(Watcher::new(config.watcher_config()?));
    let (mut diffs, id) = watcher.watch().await?;
    info!(subscriber = %id, "waiting for changes");

    let flags = config.run_flags();
    loop {
        tokio::select! {
            diff = diffs.recv() => {
                let Some(diff) = diff else {
                    break;
                };
                run_diff(diff, flags, config.json).await?;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                watcher.quit_all().await;
                break;
            }
        }
    }
    Ok(())
}

async fn run_diff(diff: Diff, flags: RunFlags, json: bool) -> Result<()> {
    for package in diff.removed() {
        info!(package = %package.import_path(), "package removed");
    }

    let packages = tokio::task::spawn_blocking(move || diff.updated())
        .await
        .context("reading test files failed")?;
    if packages.is_empty() {
        return Ok(());
    }

    let (tx, mut rx) = mpsc::channel(packages.len());
    for mut package in packages {
        let tx = tx.clone();
        tokio::spawn(async move {
            let outcome = package.run(flags).await.map(|_| ());
            let _ = tx.send((package, outcome)).await;
        });
    }
    drop(tx);

    while let Some((mut package, outcome)) = rx.recv().await {
        match outcome {
            Ok(()) => log_results(&mut package, json)?,
            Err(e) => warn!(package = %package.import_path(), error = %e, "cannot run tests"),
        }
    }
    Ok(())
}

fn log_results(package: &mut TestingPackage, json: bool) -> Result<()> {
    let Some(results) = package.last_results().cloned() else {
        return Ok(());
    };
    package.trim_to(&results);
    let report = Report::new(package.import_path(), &results);

    if let Some(error) = &report.error {
        warn!(package = %report.package, %error, "test run failed");
    } else if report.passed {
        info!(
            package = %report.package,
            tests = report.tests,
            duration_ms = report.duration_ms,
            "tests passed"
        );
    } else {
        warn!(
            package = %report.package,
            tests = report.tests,
            failed = report.failed,
            duration_ms = report.duration_ms,
            "tests failed"
        );
        for failure in &report.failures {
            warn!(package = %report.package, test = %failure, "failed");
        }
    }
    match package.suites() {
        Ok(suites) => debug!(package = %report.package, suites = suites.len(), "parsed suites"),
        Err(e) => debug!(package = %report.package, error = %e, "test files do not parse"),
    }

    if json {
        println!("{}", serde_json::to_string(&report)?);
    }
    Ok(())
}
