//! Subcommand implementations.

pub mod list;
pub mod post;
pub mod run;

use anyhow::{Context, Result};
use fuzzbatch_common::RunnerConfig;
use std::path::Path;

/// Resolve and load the runner config; a missing file is fatal.
pub fn load_config(explicit: Option<&Path>) -> Result<RunnerConfig> {
    let path = RunnerConfig::locate(explicit);
    RunnerConfig::load(&path).with_context(|| format!("failed to load configuration from {}", path.display()))
}
