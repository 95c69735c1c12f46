// SPDX-License-Identifier: MIT OR Apache-2.0
//! fuzzbatch CLI
//!
//! Drives the concurrency fuzzer over every (test, mode) pair of a Go test
//! directory and turns its statistics into comparison tables.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::error;

mod commands;
mod exit;
mod output;

use commands::{list, post, run};
use exit::{EXIT_GENERIC_FAIL, EXIT_SUCCESS};

#[derive(Parser)]
#[command(name = "fuzzbatch")]
#[command(about = "Run a concurrency fuzzer across modes and tests, then compare the results")]
#[command(long_about = r#"
Runs the external fuzzing tool once per (test, mode) pair, collects each run's
output under <TEST_DIR>/<results_dir>/<test>/<mode>/, merges logs and stat
files per test and writes a comparison.csv for every test.

Examples:
  # Every configured mode on every test in ./pkg
  fuzzbatch all-on-all ./pkg

  # One mode on one test
  fuzzbatch one-on-one ./pkg GFuzz TestRace

  # Cross-test pivot of one metric
  fuzzbatch pivot ./pkg/results --metric Total_Bugs
"#)]
#[command(version)]
struct Cli {
    /// Configuration file (default: $FUZZBATCH_CONFIG, then ./config.yaml)
    #[arg(short, long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, value_name = "LEVEL", global = true, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, global = true, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Pretty,
    Compact,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every configured mode on every test
    AllOnAll {
        test_dir: PathBuf,
    },
    /// Run every configured mode on one test
    AllOnOne {
        test_dir: PathBuf,
        test_function: String,
    },
    /// Run one mode on every test
    OneOnAll {
        test_dir: PathBuf,
        mode: String,
    },
    /// Run one mode on one test
    OneOnOne {
        test_dir: PathBuf,
        mode: String,
        test_function: String,
    },
    /// Re-merge logs and stats of one test and rebuild its comparison table
    Aggregate {
        test_results_dir: PathBuf,
    },
    /// Rebuild comparison.csv for one test
    Compare {
        test_results_dir: PathBuf,
    },
    /// Test x Mode table of one metric across all tests under ROOT_DIR
    Pivot {
        root_dir: PathBuf,
        /// Metric to pivot on; prompts for a choice when omitted
        #[arg(long, value_name = "NAME")]
        metric: Option<String>,
    },
    /// Performance and precision tables across all tests under ROOT_DIR
    Grouped {
        root_dir: PathBuf,
    },
    /// List the test functions found in TEST_DIR
    ListTests {
        test_dir: PathBuf,
    },
    /// List the metrics a pivot can be built for
    ListMetrics {
        root_dir: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    setup_logging(&cli.log_level, cli.log_format);

    if let Err(e) = dispatch(&cli) {
        error!("Command failed: {}", e);
        for cause in e.chain().skip(1) {
            error!("  Caused by: {}", cause);
        }
        std::process::exit(EXIT_GENERIC_FAIL);
    }
    std::process::exit(EXIT_SUCCESS);
}

fn dispatch(cli: &Cli) -> Result<()> {
    let config = cli.config.as_deref();
    match &cli.command {
        Commands::AllOnAll { test_dir } => run::execute(config, test_dir, run::all_on_all(), cli.json),
        Commands::AllOnOne { test_dir, test_function } => {
            run::execute(config, test_dir, run::all_on_one(test_function), cli.json)
        }
        Commands::OneOnAll { test_dir, mode } => {
            run::execute(config, test_dir, run::one_on_all(mode), cli.json)
        }
        Commands::OneOnOne { test_dir, mode, test_function } => {
            run::execute(config, test_dir, run::one_on_one(mode, test_function), cli.json)
        }
        Commands::Aggregate { test_results_dir } => post::aggregate(config, test_results_dir),
        Commands::Compare { test_results_dir } => post::compare(test_results_dir),
        Commands::Pivot { root_dir, metric } => post::pivot(root_dir, metric.as_deref()),
        Commands::Grouped { root_dir } => post::grouped(root_dir),
        Commands::ListTests { test_dir } => list::tests(test_dir, cli.json),
        Commands::ListMetrics { root_dir } => list::metrics(root_dir, cli.json),
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `--log-level`; logs go to stderr.
fn setup_logging(level: &str, format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(console::colors_enabled_stderr())
        .with_target(false);

    match format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Compact => subscriber.compact().init(),
        LogFormat::Pretty => subscriber.pretty().init(),
    }
}
