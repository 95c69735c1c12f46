//! The four batch selectors.

use anyhow::{Context, Result};
use fuzzbatch_runner::{ProcessRunner, RunLayout, Selector, check_tool, run_batch};
use std::path::Path;
use tracing::info;

use super::load_config;
use crate::output;

pub fn all_on_all() -> Selector {
    Selector::AllOnAll
}

pub fn all_on_one(test: &str) -> Selector {
    Selector::AllOnOne { test: test.to_string() }
}

pub fn one_on_all(mode: &str) -> Selector {
    Selector::OneOnAll { mode: mode.to_string() }
}

pub fn one_on_one(mode: &str, test: &str) -> Selector {
    Selector::OneOnOne { mode: mode.to_string(), test: test.to_string() }
}

pub fn execute(config: Option<&Path>, test_dir: &Path, selector: Selector, json: bool) -> Result<()> {
    let config = load_config(config)?;
    let layout = RunLayout::new(test_dir, &config.results_dir)
        .with_context(|| format!("invalid test directory {}", test_dir.display()))?;
    check_tool(&config.tool_path());

    let report = run_batch(&config, &layout, &selector, &mut ProcessRunner)
        .with_context(|| format!("{selector} batch failed"))?;
    info!(results = %layout.results_root().display(), "results collected");

    if json {
        output::print_json(&report)
    } else {
        output::print_batch_summary(&report);
        Ok(())
    }
}
