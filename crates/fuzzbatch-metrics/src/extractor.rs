//! Per-mode metric extraction.
//!
//! A mode's result directory holds up to five statistic files, each located
//! by its category prefix (`statsAll_*.csv`, `statsAnalysis_*.csv`, ...).
//! Only the first data row of each file is read. A missing file contributes
//! no keys; it is never turned into zeros.
//!
//! The analysis, fuzzing and total-time files are read by column position.
//! Each positional read first checks the header name at that position and
//! fails with [`MetricsError::SchemaMismatch`] if the layout has drifted.

use fuzzbatch_common::StatTable;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{MetricsError, Result};
use crate::record::{MetricRecord, MetricValue, keys};

/// The statistic file categories the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatCategory {
    /// Per-type unique bug counts.
    BugCatalogue,
    Analysis,
    Fuzzing,
    TotalTime,
    DetailTime,
}

impl StatCategory {
    pub const ALL: [StatCategory; 5] = [
        Self::BugCatalogue,
        Self::Analysis,
        Self::Fuzzing,
        Self::TotalTime,
        Self::DetailTime,
    ];

    /// File name prefix, without the trailing `_`.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::BugCatalogue => "statsAll",
            Self::Analysis => "statsAnalysis",
            Self::Fuzzing => "statsFuzzing",
            Self::TotalTime => "times_total",
            Self::DetailTime => "times_detail",
        }
    }
}

const UNIQUE_DETECTED_PREFIX: &str = "NoUniqueDetected";
const REPLAY_WRITTEN_PREFIX: &str = "NoReplayWritten";
const REPLAY_SUCCESSFUL_PREFIX: &str = "NoReplaySuccessful";

/// (position, expected header, metric key)
const ANALYSIS_COLUMNS: [(usize, &str, &str); 4] = [
    (1, "NumberActualBugTotal", keys::TOTAL_BUGS),
    (2, "NoLeaksTotal", keys::LEAKS),
    (5, "NoPanicsTotal", keys::PANICS),
    (6, "NoPanicsVerifiedViaReplayTotal", keys::CONFIRMED_REPLAYS),
];
const FUZZING_RUNS_COLUMN: (usize, &str) = (1, "NoRuns");
const TOTAL_TIME_COLUMN: (usize, &str) = (1, "Time");
const DETAIL_TIME_COLUMNS: [(&str, &str); 3] =
    [("Recording", keys::REC_S), ("Analysis", keys::ANA_S), ("Replay", keys::REP_S)];

/// Find the stat file for `prefix` in `dir`: `<prefix>_*.csv`, first by name.
///
/// A missing directory is treated like a directory without matches.
pub fn find_stat_file(dir: &Path, prefix: &str) -> Result<Option<PathBuf>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(MetricsError::io(dir, e)),
    };
    let wanted = format!("{prefix}_");
    let mut matches = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| MetricsError::io(dir, e))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name.starts_with(&wanted) && name.ends_with(".csv") && entry.path().is_file() {
            matches.push(entry.path());
        }
    }
    matches.sort();
    Ok(matches.into_iter().next())
}

/// Build the metric record for one mode's result directory.
pub fn extract(mode_dir: &Path) -> Result<MetricRecord> {
    let mut record = MetricRecord::new();

    for category in StatCategory::ALL {
        let Some(path) = find_stat_file(mode_dir, category.prefix())? else {
            debug!(dir = %mode_dir.display(), prefix = category.prefix(), "stat file absent");
            continue;
        };
        let Some(table) = StatTable::read(&path)? else { continue };
        let Some(row) = table.first_row() else {
            debug!(file = %path.display(), "stat file has no data row");
            continue;
        };
        match category {
            StatCategory::BugCatalogue => bug_catalogue(&path, &table, &mut record)?,
            StatCategory::Analysis => {
                for (pos, expected, key) in ANALYSIS_COLUMNS {
                    let raw = positional(&path, &table, row, pos, expected)?;
                    record.insert(key, parse_int(&path, expected, raw)?);
                }
            }
            StatCategory::Fuzzing => fuzzing(&path, &table, row, &mut record)?,
            StatCategory::TotalTime => {
                let (pos, expected) = TOTAL_TIME_COLUMN;
                let raw = positional(&path, &table, row, pos, expected)?.trim();
                match raw.parse::<f64>() {
                    Ok(secs) if !raw.is_empty() => record.insert(keys::TOTAL_TIME_S, secs),
                    _ => debug!(file = %path.display(), value = raw, "total time unparsable"),
                }
            }
            StatCategory::DetailTime => {
                for (column, value) in table.first_row_pairs() {
                    if let Some((_, key)) = DETAIL_TIME_COLUMNS.iter().find(|(c, _)| *c == column) {
                        record.insert(key, value.to_string());
                    }
                }
            }
        }
    }

    derive_rates(&mut record);
    Ok(record)
}

fn bug_catalogue(path: &Path, table: &StatTable, record: &mut MetricRecord) -> Result<()> {
    let mut types = Vec::new();
    for (column, value) in table.first_row_pairs() {
        let Some(bug_type) = column.strip_prefix(UNIQUE_DETECTED_PREFIX) else { continue };
        if parse_int(path, column, value)? > 0 {
            types.push(bug_type.to_string());
        }
    }
    record.insert(keys::UNIQUE_BUGS, types.len() as i64);
    if !types.is_empty() {
        record.insert(keys::BUG_TYPES, types.join(";"));
    }
    Ok(())
}

fn fuzzing(path: &Path, table: &StatTable, row: &[String], record: &mut MetricRecord) -> Result<()> {
    let (pos, expected) = FUZZING_RUNS_COLUMN;
    let runs = positional(path, table, row, pos, expected)?;
    record.insert(keys::TOTAL_RUNS, parse_int(path, expected, runs)?);

    let mut written = 0i64;
    let mut successful = 0i64;
    for (column, value) in table.first_row_pairs() {
        if column.starts_with(REPLAY_WRITTEN_PREFIX) {
            written += parse_int(path, column, value)?;
        } else if column.starts_with(REPLAY_SUCCESSFUL_PREFIX) {
            successful += parse_int(path, column, value)?;
        }
    }
    record.insert(keys::REPLAYS_WRITTEN, written);
    record.insert(keys::REPLAYS_SUCCESSFUL, successful);
    Ok(())
}

/// Read the cell at `pos` after checking the header there is `expected`.
fn positional<'a>(
    path: &Path,
    table: &StatTable,
    row: &'a [String],
    pos: usize,
    expected: &str,
) -> Result<&'a str> {
    let found = table.header.get(pos);
    if found.map(String::as_str) != Some(expected) {
        return Err(MetricsError::SchemaMismatch {
            file: path.to_path_buf(),
            column: pos,
            expected: expected.to_string(),
            found: found.cloned(),
        });
    }
    row.get(pos).map(String::as_str).ok_or_else(|| MetricsError::SchemaMismatch {
        file: path.to_path_buf(),
        column: pos,
        expected: expected.to_string(),
        found: None,
    })
}

fn parse_int(path: &Path, column: &str, raw: &str) -> Result<i64> {
    raw.trim().parse::<i64>().map_err(|_| MetricsError::InvalidValue {
        file: path.to_path_buf(),
        column: column.to_string(),
        value: raw.to_string(),
    })
}

/// Round to two decimals, ties to the even digit.
fn round2(v: f64) -> f64 {
    (v * 100.0).round_ties_even() / 100.0
}

/// Add the rate metrics. Only computed from inputs that are present.
///
/// The zero fallback for the per-minute rates depends on the numerator being
/// zero or absent, not on the other operand.
fn derive_rates(record: &mut MetricRecord) {
    let runs = record.get(keys::TOTAL_RUNS).and_then(MetricValue::as_i64).unwrap_or(0);
    let bugs = record.get(keys::TOTAL_BUGS).and_then(MetricValue::as_i64).unwrap_or(0);
    let time_s = record.get(keys::TOTAL_TIME_S).and_then(MetricValue::as_f64).unwrap_or(0.0);

    if runs != 0 && bugs != 0 {
        record.insert(keys::BUGS_PER_1000_RUNS, round2(bugs as f64 / runs as f64 * 1000.0));
    }
    if time_s > 0.0 {
        let minutes = time_s / 60.0;
        let per_minute = |n: i64| {
            if n != 0 { MetricValue::Real(round2(n as f64 / minutes)) } else { MetricValue::Int(0) }
        };
        record.insert(keys::BUGS_PER_MINUTE, per_minute(bugs));
        record.insert(keys::RUNS_PER_MINUTE, per_minute(runs));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec_with(pairs: &[(&str, MetricValue)]) -> MetricRecord {
        let mut r = MetricRecord::new();
        for (k, v) in pairs {
            r.insert(k, v.clone());
        }
        r
    }

    #[test]
    fn round2_breaks_ties_to_even() {
        assert_eq!(round2(0.125), 0.12);
        assert_eq!(round2(0.375), 0.38);
        assert_eq!(round2(2.345), 2.35);
        assert_eq!(round2(0.666_666), 0.67);
        assert_eq!(round2(5.0), 5.0);
    }

    #[test]
    fn tied_rates_round_to_even() {
        let mut r = rec_with(&[
            (keys::TOTAL_RUNS, MetricValue::Int(8000)),
            (keys::TOTAL_BUGS, MetricValue::Int(1)),
            (keys::TOTAL_TIME_S, MetricValue::Real(480.0)),
        ]);
        derive_rates(&mut r);
        assert_eq!(r.get(keys::BUGS_PER_1000_RUNS), Some(&MetricValue::Real(0.12)));
        assert_eq!(r.get(keys::BUGS_PER_MINUTE), Some(&MetricValue::Real(0.12)));
    }

    #[test]
    fn bugs_per_thousand_runs() {
        let mut r = rec_with(&[
            (keys::TOTAL_RUNS, MetricValue::Int(1000)),
            (keys::TOTAL_BUGS, MetricValue::Int(5)),
        ]);
        derive_rates(&mut r);
        assert_eq!(r.get(keys::BUGS_PER_1000_RUNS), Some(&MetricValue::Real(5.0)));
        assert!(!r.contains(keys::BUGS_PER_MINUTE));
    }

    #[test]
    fn bugs_per_minute() {
        let mut r = rec_with(&[
            (keys::TOTAL_TIME_S, MetricValue::Real(120.0)),
            (keys::TOTAL_BUGS, MetricValue::Int(5)),
        ]);
        derive_rates(&mut r);
        assert_eq!(r.get(keys::BUGS_PER_MINUTE), Some(&MetricValue::Real(2.5)));
        // runs absent: falls back to an integer zero
        assert_eq!(r.get(keys::RUNS_PER_MINUTE), Some(&MetricValue::Int(0)));
        assert!(!r.contains(keys::BUGS_PER_1000_RUNS));
    }

    #[test]
    fn zero_bugs_gives_zero_rate_not_absence() {
        let mut r = rec_with(&[
            (keys::TOTAL_TIME_S, MetricValue::Real(30.0)),
            (keys::TOTAL_RUNS, MetricValue::Int(10)),
            (keys::TOTAL_BUGS, MetricValue::Int(0)),
        ]);
        derive_rates(&mut r);
        assert_eq!(r.get(keys::BUGS_PER_MINUTE), Some(&MetricValue::Int(0)));
        assert_eq!(r.get(keys::RUNS_PER_MINUTE), Some(&MetricValue::Real(20.0)));
        assert!(!r.contains(keys::BUGS_PER_1000_RUNS));
    }

    #[test]
    fn no_time_means_no_per_minute_rates() {
        let mut r = rec_with(&[(keys::TOTAL_RUNS, MetricValue::Int(10))]);
        derive_rates(&mut r);
        assert!(!r.contains(keys::BUGS_PER_MINUTE));
        assert!(!r.contains(keys::RUNS_PER_MINUTE));
    }

    #[test]
    fn category_prefixes() {
        let prefixes: Vec<_> = StatCategory::ALL.iter().map(StatCategory::prefix).collect();
        assert_eq!(
            prefixes,
            vec!["statsAll", "statsAnalysis", "statsFuzzing", "times_total", "times_detail"]
        );
    }
}
