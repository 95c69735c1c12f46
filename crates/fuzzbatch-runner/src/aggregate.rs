//! Cross-mode merging of one test's artifacts.
//!
//! Outputs live under `<testResults>/combined/` and are recreated from
//! scratch on every call:
//! - `logs/<name>`: every mode's copy of a log file, each preceded by a
//!   `### Mode: .. | Subdir: .. ###` banner
//! - `stats/<prefix>_*.csv`: every mode's rows of a stat file with a leading
//!   `Mode` column

use fuzzbatch_common::{CsvWriter, RunnerConfig, read_records};
use fuzzbatch_metrics::{
    COMBINED_DIR, COMPARISON_FILE, ComparisonTable, build_comparison_table, gather_modes,
};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Result, RunnerError};

pub const LOGS_DIR: &str = "logs";
pub const STATS_DIR: &str = "stats";

/// Concatenate each named log across modes into `combined/logs/<name>`.
///
/// Modes are visited in the given order and each mode's run subdirectories
/// in sorted order. Returns the files written.
pub fn aggregate_logs(
    test_results_dir: &Path,
    modes: &[String],
    log_files: &[String],
) -> Result<Vec<PathBuf>> {
    let out_dir = test_results_dir.join(COMBINED_DIR).join(LOGS_DIR);
    fs::create_dir_all(&out_dir).map_err(|e| RunnerError::io(&out_dir, e))?;

    let mut written = Vec::with_capacity(log_files.len());
    for log_name in log_files {
        let out_path = out_dir.join(log_name);
        let file = File::create(&out_path).map_err(|e| RunnerError::io(&out_path, e))?;
        let mut out = BufWriter::new(file);
        let mut pieces = 0usize;

        for mode in modes {
            let mode_dir = test_results_dir.join(mode);
            if !mode_dir.is_dir() {
                debug!(mode = %mode, "mode has no results, skipping logs");
                continue;
            }
            for sub in sorted_subdirs(&mode_dir)? {
                let src = sub.join(log_name);
                if !src.is_file() {
                    continue;
                }
                let sub_name = sub.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
                write!(out, "\n\n### Mode: {mode} | Subdir: {sub_name} ###\n\n")
                    .map_err(|e| RunnerError::io(&out_path, e))?;
                let mut input = File::open(&src).map_err(|e| RunnerError::io(&src, e))?;
                io::copy(&mut input, &mut out).map_err(|e| RunnerError::io(&out_path, e))?;
                pieces += 1;
            }
        }
        out.flush().map_err(|e| RunnerError::io(&out_path, e))?;
        info!(path = %out_path.display(), pieces, "combined log written");
        written.push(out_path);
    }
    Ok(written)
}

/// Merge every mode's `<prefix>_*.csv` into `combined/stats/`, tagging each
/// row with its mode. Returns the files written.
///
/// The first match (by path) names the output and, unless empty, supplies the
/// header. Column layouts are assumed identical across modes.
pub fn aggregate_stats(test_results_dir: &Path, prefixes: &[String]) -> Result<Vec<PathBuf>> {
    let out_dir = test_results_dir.join(COMBINED_DIR).join(STATS_DIR);
    fs::create_dir_all(&out_dir).map_err(|e| RunnerError::io(&out_dir, e))?;
    let modes = gather_modes(test_results_dir)?;

    let mut written = Vec::new();
    for prefix in prefixes {
        let matches = stat_matches(test_results_dir, &modes, prefix)?;
        let Some((first, _)) = matches.first() else {
            debug!(prefix = %prefix, "no stat files to merge");
            continue;
        };
        let Some(name) = first.file_name() else { continue };
        let out_path = out_dir.join(name);

        let mut writer = CsvWriter::create(&out_path)?;
        let mut header_written = false;
        let mut rows = 0usize;
        for (path, mode) in &matches {
            let records = read_records(path)?;
            let Some((header, data)) = records.split_first() else {
                debug!(file = %path.display(), "empty stat file skipped");
                continue;
            };
            if !header_written {
                writer.write_record(&tagged("Mode", header))?;
                header_written = true;
            }
            for row in data {
                writer.write_record(&tagged(mode, row))?;
                rows += 1;
            }
        }
        writer.finish()?;
        info!(path = %out_path.display(), files = matches.len(), rows, "combined stats written");
        written.push(out_path);
    }
    Ok(written)
}

fn tagged(first: &str, rest: &[String]) -> Vec<String> {
    let mut row = Vec::with_capacity(rest.len() + 1);
    row.push(first.to_string());
    row.extend(rest.iter().cloned());
    row
}

/// `(path, mode)` for every `<mode>/<prefix>_*.csv`, sorted by path.
fn stat_matches(
    test_results_dir: &Path,
    modes: &[String],
    prefix: &str,
) -> Result<Vec<(PathBuf, String)>> {
    let wanted = format!("{prefix}_");
    let mut matches = Vec::new();
    for mode in modes {
        let mode_dir = test_results_dir.join(mode);
        let entries = fs::read_dir(&mode_dir).map_err(|e| RunnerError::io(&mode_dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| RunnerError::io(&mode_dir, e))?;
            let path = entry.path();
            if let Some(name) = path.file_name().and_then(|n| n.to_str())
                && name.starts_with(&wanted)
                && name.ends_with(".csv")
                && path.is_file()
            {
                matches.push((path, mode.clone()));
            }
        }
    }
    matches.sort();
    Ok(matches)
}

fn sorted_subdirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| RunnerError::io(dir, e))?;
    let mut subdirs = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| RunnerError::io(dir, e))?.path();
        if path.is_dir() {
            subdirs.push(path);
        }
    }
    subdirs.sort();
    Ok(subdirs)
}

/// Log concatenation order: configured modes first, then any other mode
/// directories on disk, sorted.
pub fn log_mode_order(configured: &[String], on_disk: &[String]) -> Vec<String> {
    let mut order: Vec<String> = configured.to_vec();
    order.extend(on_disk.iter().filter(|m| !configured.contains(m)).cloned());
    order
}

/// What [`aggregate_test`] produced.
#[derive(Debug, Clone)]
pub struct AggregateSummary {
    pub logs: Vec<PathBuf>,
    pub stats: Vec<PathBuf>,
    pub comparison_path: PathBuf,
    pub comparison: ComparisonTable,
}

/// Merge logs and stats for one test, then rebuild its `comparison.csv`.
pub fn aggregate_test(test_results_dir: &Path, config: &RunnerConfig) -> Result<AggregateSummary> {
    if !test_results_dir.is_dir() {
        return Err(RunnerError::InvalidTestDir { path: test_results_dir.to_path_buf() });
    }
    let modes = gather_modes(test_results_dir)?;
    let log_modes = log_mode_order(&config.modes, &modes);
    let logs = aggregate_logs(test_results_dir, &log_modes, &config.log_files)?;
    let stats = aggregate_stats(test_results_dir, &config.stat_prefixes)?;
    let comparison = build_comparison_table(test_results_dir, &modes)?;
    Ok(AggregateSummary {
        logs,
        stats,
        comparison_path: test_results_dir.join(COMPARISON_FILE),
        comparison,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn log_order_keeps_configured_then_extras() {
        let order = log_mode_order(&strings(&["GFuzz", "Flow"]), &strings(&["Extra", "Flow", "GFuzz"]));
        assert_eq!(order, strings(&["GFuzz", "Flow", "Extra"]));
    }

    #[test]
    fn log_banner_and_contents() {
        let dir = tempfile::tempdir().unwrap();
        let run = dir.path().join("GFuzz").join("run1");
        fs::create_dir_all(&run).unwrap();
        fs::write(run.join("output.log"), "line a\n").unwrap();

        let written =
            aggregate_logs(dir.path(), &strings(&["GFuzz", "Missing"]), &strings(&["output.log"]))
                .unwrap();
        assert_eq!(written.len(), 1);
        let text = fs::read_to_string(&written[0]).unwrap();
        assert_eq!(text, "\n\n### Mode: GFuzz | Subdir: run1 ###\n\nline a\n");
    }

    #[test]
    fn stats_use_first_match_name_and_skip_empty_files() {
        let dir = tempfile::tempdir().unwrap();
        for m in ["A", "B"] {
            fs::create_dir_all(dir.path().join(m)).unwrap();
        }
        fs::write(dir.path().join("A").join("statsFuzzing_T.csv"), "").unwrap();
        fs::write(dir.path().join("B").join("statsFuzzing_T.csv"), "TestName,NoRuns\nT,5\n").unwrap();

        let written = aggregate_stats(dir.path(), &strings(&["statsFuzzing", "statsAll"])).unwrap();
        assert_eq!(written.len(), 1);
        assert!(written[0].ends_with("combined/stats/statsFuzzing_T.csv"));
        assert_eq!(fs::read_to_string(&written[0]).unwrap(), "Mode,TestName,NoRuns\nB,T,5\n");
    }
}
