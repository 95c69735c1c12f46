// SPDX-License-Identifier: MIT OR Apache-2.0
//! Batch driver for the external concurrency fuzzer.
//!
//! A batch walks (test, mode) pairs, runs the tool once per pair, moves its
//! output into `<testDir>/<results_dir>/<test>/<mode>/`, then merges logs and
//! stat files per test and rebuilds that test's `comparison.csv`.

pub mod aggregate;
pub mod collect;
pub mod command;
pub mod discovery;
pub mod error;
pub mod layout;
pub mod orchestrator;

pub use aggregate::{
    AggregateSummary, LOGS_DIR, STATS_DIR, aggregate_logs, aggregate_stats, aggregate_test,
    log_mode_order,
};
pub use collect::{collect, move_entries};
pub use command::ToolInvocation;
pub use discovery::{list_tests, tests_in_source};
pub use error::{Result, RunnerError};
pub use layout::{DEFAULT_OUTPUT_DIR, RunLayout};
pub use orchestrator::{
    BatchReport, InvocationOutcome, InvocationRecord, ProcessRunner, Selector, TestOutcome,
    ToolRunner, check_tool, run_batch,
};
