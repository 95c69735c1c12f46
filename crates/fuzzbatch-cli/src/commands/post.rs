//! Post-processing of existing results, without running the tool.

use anyhow::{Context, Result, bail};
use fuzzbatch_metrics::{
    MetricSelector, PromptSelector, available_metrics, build_comparison_table,
    build_grouped_tables, gather_modes, load_comparisons, render_table, write_pivot,
};
use fuzzbatch_runner::aggregate_test;
use std::io;
use std::path::Path;

use super::load_config;
use crate::output;

pub fn aggregate(config: Option<&Path>, test_results_dir: &Path) -> Result<()> {
    let config = load_config(config)?;
    let summary = aggregate_test(test_results_dir, &config)
        .with_context(|| format!("aggregation failed for {}", test_results_dir.display()))?;
    for path in summary.logs.iter().chain(&summary.stats) {
        println!("{}", path.display());
    }
    println!("{}", summary.comparison_path.display());
    Ok(())
}

pub fn compare(test_results_dir: &Path) -> Result<()> {
    output::require_dir(test_results_dir)?;
    let modes = gather_modes(test_results_dir)?;
    let table = build_comparison_table(test_results_dir, &modes)
        .with_context(|| format!("comparison failed for {}", test_results_dir.display()))?;
    print!("{}", render_table(&table.header, &table.cells()));
    Ok(())
}

pub fn pivot(root: &Path, metric: Option<&str>) -> Result<()> {
    output::require_dir(root)?;
    let set = load_comparisons(root)?;
    let metric = match metric {
        Some(m) => m.to_string(),
        None => {
            let available = available_metrics(&set);
            let stdin = io::stdin();
            let mut selector = PromptSelector::new(stdin.lock(), io::stdout());
            match selector.select(&available).context("failed to read metric choice")? {
                Some(m) => m,
                None => bail!("invalid metric selection"),
            }
        }
    };

    let pivot = write_pivot(root, &set, &metric)?;
    print!("{}", pivot.render_text());
    Ok(())
}

pub fn grouped(root: &Path) -> Result<()> {
    output::require_dir(root)?;
    let tables = build_grouped_tables(root)?;
    output::print_heading("Performance");
    print!("{}", tables.performance.render_text());
    println!();
    output::print_heading("Precision");
    print!("{}", tables.precision.render_text());
    Ok(())
}
