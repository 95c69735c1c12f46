//! Batch orchestration.
//!
//! Runs are strictly sequential: the tool writes every run to the same
//! output directory, so two live runs would clobber each other.

use fuzzbatch_common::RunnerConfig;
use serde::Serialize;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::aggregate::aggregate_test;
use crate::collect::collect;
use crate::command::ToolInvocation;
use crate::discovery::list_tests;
use crate::error::{Result, RunnerError};
use crate::layout::RunLayout;

/// Which (test, mode) pairs a batch covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    AllOnAll,
    AllOnOne { test: String },
    OneOnAll { mode: String },
    OneOnOne { mode: String, test: String },
}

impl Selector {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AllOnAll => "all-on-all",
            Self::AllOnOne { .. } => "all-on-one",
            Self::OneOnAll { .. } => "one-on-all",
            Self::OneOnOne { .. } => "one-on-one",
        }
    }

    fn tests(&self, layout: &RunLayout) -> Result<Vec<String>> {
        match self {
            Self::AllOnOne { test } | Self::OneOnOne { test, .. } => Ok(vec![test.clone()]),
            Self::AllOnAll | Self::OneOnAll { .. } => {
                let tests = list_tests(layout.test_dir())?;
                if tests.is_empty() {
                    return Err(RunnerError::NoTests { dir: layout.test_dir().to_path_buf() });
                }
                Ok(tests)
            }
        }
    }

    fn modes(&self, config: &RunnerConfig) -> Result<Vec<String>> {
        match self {
            Self::OneOnAll { mode } | Self::OneOnOne { mode, .. } => {
                if !config.knows_mode(mode) {
                    warn!(mode = %mode, "mode is not in the configured list");
                }
                Ok(vec![mode.clone()])
            }
            Self::AllOnAll | Self::AllOnOne { .. } => {
                if config.modes.is_empty() {
                    return Err(RunnerError::NoModes);
                }
                Ok(config.modes.clone())
            }
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Executes the tool. Returns the exit code, `None` if the process was
/// terminated by a signal.
pub trait ToolRunner {
    fn run(&mut self, invocation: &ToolInvocation) -> io::Result<Option<i32>>;
}

/// Runs the real tool as a child process with inherited stdio and waits for it.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl ToolRunner for ProcessRunner {
    fn run(&mut self, invocation: &ToolInvocation) -> io::Result<Option<i32>> {
        let status = invocation.to_command().status()?;
        Ok(status.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InvocationOutcome {
    Exited { code: Option<i32> },
    SpawnFailed { error: String },
}

impl InvocationOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Exited { code: Some(0) })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvocationRecord {
    pub test: String,
    pub mode: String,
    pub outcome: InvocationOutcome,
    pub results_dir: PathBuf,
    /// Set when the run's output could not be moved into `results_dir`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collect_error: Option<String>,
}

impl InvocationRecord {
    /// The tool exited with 0 and its output was collected.
    pub fn succeeded(&self) -> bool {
        self.outcome.succeeded() && self.collect_error.is_none()
    }
}

/// Post-processing result for one test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestOutcome {
    pub test: String,
    pub results_dir: PathBuf,
    /// Path of the rebuilt `comparison.csv`, if aggregation succeeded.
    pub comparison: Option<PathBuf>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub selector: String,
    pub test_dir: PathBuf,
    pub invocations: Vec<InvocationRecord>,
    pub tests: Vec<TestOutcome>,
}

impl BatchReport {
    /// Invocations that did not exit with status 0 or whose output was not collected.
    pub fn failed_invocations(&self) -> usize {
        self.invocations.iter().filter(|i| !i.succeeded()).count()
    }

    pub fn comparisons_written(&self) -> usize {
        self.tests.iter().filter(|t| t.comparison.is_some()).count()
    }
}

/// Warn when the configured tool is not an executable file.
pub fn check_tool(path: &Path) -> bool {
    let ok = is_executable(path);
    if !ok {
        warn!(path = %path.display(), "fuzzing tool is missing or not executable");
    }
    ok
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata().is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Run every selected (test, mode) pair, tests in the outer loop.
///
/// After the last mode of a test, its logs and stats are merged and its
/// comparison table rebuilt. A failing tool run or collection never stops the
/// batch, and a failing aggregation is recorded against its test.
pub fn run_batch<R: ToolRunner + ?Sized>(
    config: &RunnerConfig,
    layout: &RunLayout,
    selector: &Selector,
    runner: &mut R,
) -> Result<BatchReport> {
    let tests = selector.tests(layout)?;
    let modes = selector.modes(config)?;
    info!(
        selector = %selector,
        tests = tests.len(),
        modes = modes.len(),
        dir = %layout.test_dir().display(),
        "starting batch"
    );

    let mut report = BatchReport {
        selector: selector.name().to_string(),
        test_dir: layout.test_dir().to_path_buf(),
        invocations: Vec::with_capacity(tests.len() * modes.len()),
        tests: Vec::with_capacity(tests.len()),
    };

    for test in &tests {
        for mode in &modes {
            let record = run_one(config, layout, test, mode, runner)?;
            report.invocations.push(record);
        }

        let results_dir = layout.test_results_dir(test);
        let outcome = match aggregate_test(&results_dir, config) {
            Ok(summary) => TestOutcome {
                test: test.clone(),
                results_dir,
                comparison: Some(summary.comparison_path),
                error: None,
            },
            Err(e) => {
                error!(test = %test, error = %e, "aggregation failed");
                TestOutcome { test: test.clone(), results_dir, comparison: None, error: Some(e.to_string()) }
            }
        };
        report.tests.push(outcome);
    }

    info!(
        invocations = report.invocations.len(),
        failed = report.failed_invocations(),
        comparisons = report.comparisons_written(),
        "batch finished"
    );
    Ok(report)
}

fn run_one<R: ToolRunner + ?Sized>(
    config: &RunnerConfig,
    layout: &RunLayout,
    test: &str,
    mode: &str,
    runner: &mut R,
) -> Result<InvocationRecord> {
    let dest = layout.mode_results_dir(test, mode);
    std::fs::create_dir_all(&dest).map_err(|e| RunnerError::io(&dest, e))?;

    let invocation = ToolInvocation::new(config, layout, test, mode);
    info!(test, mode, command = %invocation, "running tool");
    let outcome = match runner.run(&invocation) {
        Ok(code) => {
            if code != Some(0) {
                warn!(test, mode, code = ?code, "tool exited unsuccessfully");
            }
            InvocationOutcome::Exited { code }
        }
        Err(e) => {
            error!(test, mode, program = %invocation.program.display(), error = %e, "failed to start tool");
            InvocationOutcome::SpawnFailed { error: e.to_string() }
        }
    };

    let (results_dir, collect_error) = match collect(layout, test, mode) {
        Ok(dir) => (dir, None),
        Err(e) => {
            error!(test, mode, error = %e, "failed to collect tool output");
            (dest, Some(e.to_string()))
        }
    };
    Ok(InvocationRecord {
        test: test.to_string(),
        mode: mode.to_string(),
        outcome,
        results_dir,
        collect_error,
    })
}
