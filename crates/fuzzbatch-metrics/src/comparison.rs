//! Per-test comparison table: one row per mode, one column per metric.

use fuzzbatch_common::CsvWriter;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{MetricsError, Result};
use crate::extractor::extract;
use crate::record::MetricRecord;

/// File name of the per-test comparison table.
pub const COMPARISON_FILE: &str = "comparison.csv";

/// Subdirectory of a test's results that holds combined artifacts, never a mode.
pub const COMBINED_DIR: &str = "combined";

/// Metric records of every mode of one test.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComparisonTable {
    /// `Mode` followed by the sorted union of metric keys.
    pub header: Vec<String>,
    pub rows: Vec<(String, MetricRecord)>,
}

impl ComparisonTable {
    /// Assemble a table from already extracted records.
    pub fn from_records(rows: Vec<(String, MetricRecord)>) -> Self {
        let keys: BTreeSet<&str> = rows.iter().flat_map(|(_, r)| r.keys()).collect();
        let mut header = vec!["Mode".to_string()];
        header.extend(keys.into_iter().map(str::to_string));
        Self { header, rows }
    }

    pub fn record(&self, mode: &str) -> Option<&MetricRecord> {
        self.rows.iter().find(|(m, _)| m == mode).map(|(_, r)| r)
    }

    /// CSV cells row by row; absent metrics are blank.
    pub fn cells(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|(mode, record)| {
                std::iter::once(mode.clone())
                    .chain(self.header[1..].iter().map(|k| record.cell(k)))
                    .collect()
            })
            .collect()
    }

    /// Write the table, replacing any existing file.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = CsvWriter::create(path)?;
        writer.write_record(&self.header)?;
        for row in self.cells() {
            writer.write_record(&row)?;
        }
        writer.finish()?;
        Ok(())
    }
}

/// Mode directories of a test's results, sorted, without `combined`.
pub fn gather_modes(test_results_dir: &Path) -> Result<Vec<String>> {
    let entries =
        std::fs::read_dir(test_results_dir).map_err(|e| MetricsError::io(test_results_dir, e))?;
    let mut modes = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| MetricsError::io(test_results_dir, e))?;
        if !entry.path().is_dir() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str()
            && name != COMBINED_DIR
        {
            modes.push(name.to_string());
        }
    }
    modes.sort();
    Ok(modes)
}

/// Extract every mode's metrics and persist `comparison.csv` in `test_results_dir`.
///
/// Any previous table is removed first; if extraction fails no table is left.
pub fn build_comparison_table(test_results_dir: &Path, modes: &[String]) -> Result<ComparisonTable> {
    let out = test_results_dir.join(COMPARISON_FILE);
    match std::fs::remove_file(&out) {
        Ok(()) => debug!(path = %out.display(), "removed previous comparison table"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(MetricsError::io(&out, e)),
    }

    let mut rows = Vec::with_capacity(modes.len());
    for mode in modes {
        let record = extract(&test_results_dir.join(mode))?;
        rows.push((mode.clone(), record));
    }
    let table = ComparisonTable::from_records(rows);
    table.write_csv(&out)?;
    info!(path = %out.display(), modes = modes.len(), "comparison table written");
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::keys;

    #[test]
    fn header_is_sorted_union_and_missing_cells_blank() {
        let mut a = MetricRecord::new();
        a.insert(keys::TOTAL_BUGS, 3i64);
        a.insert(keys::LEAKS, 1i64);
        let mut b = MetricRecord::new();
        b.insert(keys::TOTAL_BUGS, 7i64);
        b.insert(keys::TOTAL_RUNS, 50i64);

        let t = ComparisonTable::from_records(vec![("A".into(), a), ("B".into(), b)]);
        assert_eq!(t.header, vec!["Mode", "Leaks", "Total_Bugs", "Total_Runs"]);
        assert_eq!(
            t.cells(),
            vec![vec!["A", "1", "3", ""], vec!["B", "", "7", "50"]]
                .into_iter()
                .map(|r| r.into_iter().map(String::from).collect::<Vec<_>>())
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn empty_records_give_mode_only_header() {
        let t = ComparisonTable::from_records(vec![("A".into(), MetricRecord::new())]);
        assert_eq!(t.header, vec!["Mode"]);
        assert_eq!(t.cells(), vec![vec!["A".to_string()]]);
    }

    #[test]
    fn gather_modes_skips_combined_and_files() {
        let dir = tempfile::tempdir().unwrap();
        for d in ["Flow", "GFuzz", "combined"] {
            std::fs::create_dir(dir.path().join(d)).unwrap();
        }
        std::fs::write(dir.path().join(COMPARISON_FILE), "Mode\n").unwrap();
        assert_eq!(gather_modes(dir.path()).unwrap(), vec!["Flow", "GFuzz"]);
    }
}
