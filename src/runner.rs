//! Parallel execution of validation test scripts.
//!
//! Every discovered unit runs as its own interpreter process with no shared
//! state, so units are dispatched through a bounded pool: up to `jobs` tasks
//! in flight, new units drawn from the lexical queue as earlier ones finish.
//! Completion order is nondeterministic, so results are sorted by path before
//! anything is reported.

use crate::error::BuildError;
use crate::scanner::TestUnit;
use anyhow::{Context, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;

/// How the runner executes and reports.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub interpreter: String,
    /// Directory the test processes run from (the project root)
    pub cwd: PathBuf,
    pub jobs: usize,
    pub timeout: Duration,
    /// Stop launching new units after the first observed failure.
    pub fail_fast: bool,
}

/// Terminal state of one test unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestOutcome {
    Passed,
    Failed { code: Option<i32> },
    TimedOut { limit: Duration },
}

/// Captured result of one test unit.
#[derive(Debug)]
pub struct TestResult {
    pub relative_path: PathBuf,
    pub outcome: TestOutcome,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl TestResult {
    pub fn passed(&self) -> bool {
        self.outcome == TestOutcome::Passed
    }
}

/// Aggregate of a completed run.
#[derive(Debug)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    /// Relative paths of failing units, in lexical order.
    pub failed: Vec<PathBuf>,
}

impl RunSummary {
    pub fn from_results(results: &[TestResult]) -> Self {
        let failed: Vec<PathBuf> = results
            .iter()
            .filter(|r| !r.passed())
            .map(|r| r.relative_path.clone())
            .collect();
        Self {
            total: results.len(),
            passed: results.len() - failed.len(),
            failed,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Runs the units through the bounded pool and returns their results sorted
/// by path.
///
/// In fail-fast mode the first failure stops further launches; units already
/// in flight are awaited rather than killed, so their results are included.
pub async fn run_tests(units: Vec<TestUnit>, options: &RunOptions) -> Result<Vec<TestResult>> {
    if units.is_empty() {
        log::info!("no test files found to run");
        return Ok(Vec::new());
    }

    // resolve the interpreter once, before anything is spawned
    let interpreter = match which::which(&options.interpreter) {
        Ok(path) => path,
        Err(_) => {
            return Err(BuildError::ToolchainMissing {
                tool: options.interpreter.clone(),
            }
            .into())
        }
    };

    let jobs = options.jobs.max(1);
    log::info!(
        "running {} test(s) with {} worker(s), {}s timeout",
        units.len(),
        jobs,
        options.timeout.as_secs()
    );

    let mut queue = units.into_iter();
    let mut in_flight = FuturesUnordered::new();
    let mut results = Vec::new();
    let mut launching = true;

    while in_flight.len() < jobs {
        let Some(unit) = queue.next() else { break };
        in_flight.push(tokio::spawn(run_unit(
            interpreter.clone(),
            options.cwd.clone(),
            unit,
            options.timeout,
        )));
    }

    while let Some(joined) = in_flight.next().await {
        let result = joined.context("test task panicked")??;

        match &result.outcome {
            TestOutcome::Passed => {
                log::info!(
                    "PASS {} ({} ms)",
                    result.relative_path.display(),
                    result.duration.as_millis()
                );
            }
            TestOutcome::Failed { .. } | TestOutcome::TimedOut { .. } => {
                log::warn!("FAIL {}", result.relative_path.display());
                if options.fail_fast && launching {
                    launching = false;
                    log::info!("fail-fast: not launching further tests");
                }
            }
        }
        results.push(result);

        if launching {
            if let Some(unit) = queue.next() {
                in_flight.push(tokio::spawn(run_unit(
                    interpreter.clone(),
                    options.cwd.clone(),
                    unit,
                    options.timeout,
                )));
            }
        }
    }

    results.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(results)
}

/// Runs a single unit to completion or until the time limit expires.
async fn run_unit(
    interpreter: PathBuf,
    cwd: PathBuf,
    unit: TestUnit,
    limit: Duration,
) -> Result<TestResult> {
    log::info!("running {}", unit.relative_path.display());
    let started = Instant::now();

    let child = Command::new(&interpreter)
        .arg(&unit.path)
        .current_dir(&cwd)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| {
            format!(
                "Failed to spawn '{}' for {}",
                interpreter.display(),
                unit.relative_path.display()
            )
        })?;

    let output = match tokio::time::timeout(limit, child.wait_with_output()).await {
        Ok(waited) => waited
            .with_context(|| format!("Failed to run {}", unit.relative_path.display()))?,
        Err(_) => {
            // the timed-out child is killed when its handle drops
            return Ok(TestResult {
                relative_path: unit.relative_path,
                outcome: TestOutcome::TimedOut { limit },
                stdout: String::new(),
                stderr: String::new(),
                duration: started.elapsed(),
            });
        }
    };

    let outcome = if output.status.success() {
        TestOutcome::Passed
    } else {
        TestOutcome::Failed {
            code: output.status.code(),
        }
    };

    Ok(TestResult {
        relative_path: unit.relative_path,
        outcome,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        duration: started.elapsed(),
    })
}
