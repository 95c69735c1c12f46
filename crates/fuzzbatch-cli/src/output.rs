//! Console output.

use anyhow::{Context, Result, bail};
use console::style;
use fuzzbatch_runner::{BatchReport, InvocationOutcome};
use serde::Serialize;
use std::path::Path;

pub fn require_dir(path: &Path) -> Result<()> {
    if !path.is_dir() {
        bail!("not a directory: {}", path.display());
    }
    Ok(())
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{text}");
    Ok(())
}

pub fn print_heading(title: &str) {
    println!("{}", style(title).bold().cyan());
}

pub fn print_batch_summary(report: &BatchReport) {
    print_heading(&format!("Batch {} in {}", report.selector, report.test_dir.display()));
    for inv in &report.invocations {
        let status = match &inv.outcome {
            InvocationOutcome::Exited { code: Some(0) } => style("✓ ok".to_string()).green(),
            InvocationOutcome::Exited { code: Some(code) } => style(format!("✗ exit {code}")).yellow(),
            InvocationOutcome::Exited { code: None } => style("✗ killed".to_string()).red(),
            InvocationOutcome::SpawnFailed { error } => style(format!("✗ not started: {error}")).red(),
        };
        println!("  {:<32} {:<12} {}", inv.test, inv.mode, status);
        if let Some(err) = &inv.collect_error {
            println!("  {:<32} {:<12} {}", "", "", style(format!("✗ not collected: {err}")).red());
        }
    }
    for test in &report.tests {
        match (&test.comparison, &test.error) {
            (Some(path), _) => println!("{} {}", style("comparison:").bold(), path.display()),
            (None, Some(err)) => println!("{} {}: {err}", style("aggregation failed:").red().bold(), test.test),
            (None, None) => {}
        }
    }
    println!(
        "{} runs, {} unsuccessful, {} comparison tables",
        report.invocations.len(),
        report.failed_invocations(),
        report.comparisons_written()
    );
}
