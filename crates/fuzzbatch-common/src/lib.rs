// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shared building blocks for the fuzzbatch pipeline.
//!
//! This crate holds the pieces every other fuzzbatch crate leans on:
//! - [`config`]: the YAML runner configuration
//! - [`table`]: reading and writing the CSV statistic tables the fuzzing tool emits
//! - [`error`]: the common error type and `Result` alias

pub mod config;
pub mod error;
pub mod table;

pub use config::{CONFIG_ENV_VAR, DEFAULT_CONFIG_FILE, RunnerConfig};
pub use error::{CommonError, Result};
pub use table::{CsvWriter, StatTable, format_record, parse_records, read_records};
