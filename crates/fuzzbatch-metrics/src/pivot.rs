//! Cross-test tables built from every test's `comparison.csv`.
//!
//! - [`build_pivot`]: Test x Mode matrix of one metric
//!   (`comparison_pivot_<metric>.csv`); [`write_pivot`] does the same for a
//!   set that is already loaded
//! - [`build_grouped_tables`]: wide Test/Mode tables for a fixed set of
//!   performance and precision metrics

use fuzzbatch_common::{CsvWriter, StatTable};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::comparison::COMPARISON_FILE;
use crate::error::{MetricsError, Result};
use crate::record::keys;
use crate::render::render_table;

/// Cell text for a (test, mode) pair with no value.
pub const PIVOT_PLACEHOLDER: &str = "-";

pub const PERFORMANCE_METRICS: [&str; 5] =
    [keys::TOTAL_TIME_S, keys::REC_S, keys::ANA_S, keys::REP_S, keys::RUNS_PER_MINUTE];

pub const PRECISION_METRICS: [&str; 5] = [
    keys::UNIQUE_BUGS,
    keys::TOTAL_BUGS,
    keys::BUG_TYPES,
    keys::BUGS_PER_1000_RUNS,
    keys::BUGS_PER_MINUTE,
];

pub const PERFORMANCE_FILE: &str = "performance_comparison.csv";
pub const PRECISION_FILE: &str = "precision_comparison.csv";

/// One row of some test's comparison table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonRow {
    pub test: String,
    pub mode: String,
    /// Metric name to raw cell text, `Mode` excluded.
    pub cells: BTreeMap<String, String>,
}

impl ComparisonRow {
    /// The cell for `metric`, treating a blank cell as absent.
    pub fn value(&self, metric: &str) -> Option<&str> {
        self.cells.get(metric).map(String::as_str).filter(|v| !v.is_empty())
    }
}

/// All comparison rows found under a root directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComparisonSet {
    pub rows: Vec<ComparisonRow>,
    /// Metric columns in order of first appearance.
    pub columns: Vec<String>,
}

/// Load `comparison.csv` from every immediate subdirectory of `root`, in
/// sorted directory order, tagging rows with the directory (test) name.
pub fn load_comparisons(root: &Path) -> Result<ComparisonSet> {
    let entries = std::fs::read_dir(root).map_err(|e| MetricsError::io(root, e))?;
    let mut tests = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| MetricsError::io(root, e))?;
        let path = entry.path();
        if path.is_dir() && path.join(COMPARISON_FILE).is_file() {
            tests.push((entry.file_name().to_string_lossy().into_owned(), path));
        }
    }
    if tests.is_empty() {
        return Err(MetricsError::NoComparisons { root: root.to_path_buf() });
    }
    tests.sort();

    let mut set = ComparisonSet::default();
    for (test, dir) in tests {
        let file = dir.join(COMPARISON_FILE);
        let Some(table) = StatTable::read(&file)? else { continue };
        let Some(mode_idx) = table.column_index("Mode") else {
            return Err(MetricsError::SchemaMismatch {
                file,
                column: 0,
                expected: "Mode".to_string(),
                found: table.header.first().cloned(),
            });
        };
        for column in table.header.iter().filter(|c| *c != "Mode") {
            if !set.columns.contains(column) {
                set.columns.push(column.clone());
            }
        }
        for row in &table.rows {
            let mode = row.get(mode_idx).cloned().unwrap_or_default();
            let cells = table
                .header
                .iter()
                .zip(row.iter())
                .enumerate()
                .filter(|(i, _)| *i != mode_idx)
                .map(|(_, (h, v))| (h.clone(), v.clone()))
                .collect();
            set.rows.push(ComparisonRow { test: test.clone(), mode, cells });
        }
    }
    Ok(set)
}

/// Metric names a pivot can be built for.
pub fn available_metrics(set: &ComparisonSet) -> Vec<String> {
    set.columns.iter().filter(|c| *c != "Test" && *c != "Mode").cloned().collect()
}

pub fn pivot_file_name(metric: &str) -> String {
    format!("comparison_pivot_{metric}.csv")
}

/// Test x Mode matrix of one metric.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PivotTable {
    pub metric: String,
    /// Sorted test names.
    pub tests: Vec<String>,
    /// Sorted mode names.
    pub modes: Vec<String>,
    cells: BTreeMap<(String, String), String>,
}

impl PivotTable {
    pub fn from_set(set: &ComparisonSet, metric: &str) -> Result<Self> {
        if !set.columns.iter().any(|c| c == metric) {
            return Err(MetricsError::UnknownMetric { metric: metric.to_string() });
        }
        let mut tests = BTreeSet::new();
        let mut modes = BTreeSet::new();
        let mut seen = BTreeSet::new();
        let mut cells = BTreeMap::new();
        for row in &set.rows {
            tests.insert(row.test.clone());
            modes.insert(row.mode.clone());
            let key = (row.test.clone(), row.mode.clone());
            if !seen.insert(key.clone()) {
                warn!(test = %row.test, mode = %row.mode, "duplicate comparison row, keeping the later one");
            }
            match row.value(metric) {
                Some(v) => cells.insert(key, v.to_string()),
                None => cells.remove(&key),
            };
        }
        Ok(Self {
            metric: metric.to_string(),
            tests: tests.into_iter().collect(),
            modes: modes.into_iter().collect(),
            cells,
        })
    }

    pub fn cell(&self, test: &str, mode: &str) -> Option<&str> {
        self.cells.get(&(test.to_string(), mode.to_string())).map(String::as_str)
    }

    pub fn header(&self) -> Vec<String> {
        std::iter::once("Test".to_string()).chain(self.modes.iter().cloned()).collect()
    }

    /// Rows with the placeholder filled in.
    pub fn grid(&self) -> Vec<Vec<String>> {
        self.tests
            .iter()
            .map(|test| {
                std::iter::once(test.clone())
                    .chain(self.modes.iter().map(|mode| {
                        self.cell(test, mode).unwrap_or(PIVOT_PLACEHOLDER).to_string()
                    }))
                    .collect()
            })
            .collect()
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        write_rows(path, &self.header(), &self.grid())
    }

    pub fn render_text(&self) -> String {
        render_table(&self.header(), &self.grid())
    }
}

/// Build the pivot for `metric` and persist it under `root`.
pub fn build_pivot(root: &Path, metric: &str) -> Result<PivotTable> {
    let set = load_comparisons(root)?;
    write_pivot(root, &set, metric)
}

/// Pivot an already loaded set and write `pivot_<metric>.csv` under `root`.
pub fn write_pivot(root: &Path, set: &ComparisonSet, metric: &str) -> Result<PivotTable> {
    let pivot = PivotTable::from_set(set, metric)?;
    let out = root.join(pivot_file_name(metric));
    pivot.write_csv(&out)?;
    info!(path = %out.display(), tests = pivot.tests.len(), "pivot table written");
    Ok(pivot)
}

/// A plain (Test, Mode, metric...) table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WideTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl WideTable {
    /// Keep the `metrics` that appear in at least one comparison header, in
    /// the given order. Absent cells stay blank.
    pub fn from_set(set: &ComparisonSet, metrics: &[&str]) -> Self {
        let present: Vec<&str> =
            metrics.iter().copied().filter(|m| set.columns.iter().any(|c| c == m)).collect();
        let mut header = vec!["Test".to_string(), "Mode".to_string()];
        header.extend(present.iter().map(|m| m.to_string()));
        let rows = set
            .rows
            .iter()
            .map(|row| {
                [row.test.clone(), row.mode.clone()]
                    .into_iter()
                    .chain(present.iter().map(|m| row.cells.get(*m).cloned().unwrap_or_default()))
                    .collect()
            })
            .collect();
        Self { header, rows }
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        write_rows(path, &self.header, &self.rows)
    }

    pub fn render_text(&self) -> String {
        render_table(&self.header, &self.rows)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupedTables {
    pub performance: WideTable,
    pub precision: WideTable,
    pub performance_path: PathBuf,
    pub precision_path: PathBuf,
}

/// Build and persist the performance and precision tables under `root`.
pub fn build_grouped_tables(root: &Path) -> Result<GroupedTables> {
    let set = load_comparisons(root)?;
    let performance = WideTable::from_set(&set, &PERFORMANCE_METRICS);
    let precision = WideTable::from_set(&set, &PRECISION_METRICS);

    let performance_path = root.join(PERFORMANCE_FILE);
    let precision_path = root.join(PRECISION_FILE);
    performance.write_csv(&performance_path)?;
    precision.write_csv(&precision_path)?;
    info!(root = %root.display(), rows = set.rows.len(), "grouped comparison tables written");

    Ok(GroupedTables { performance, precision, performance_path, precision_path })
}

fn write_rows(path: &Path, header: &[String], rows: &[Vec<String>]) -> Result<()> {
    let mut writer = CsvWriter::create(path)?;
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(test: &str, mode: &str, cells: &[(&str, &str)]) -> ComparisonRow {
        ComparisonRow {
            test: test.into(),
            mode: mode.into(),
            cells: cells.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        }
    }

    fn set(rows: Vec<ComparisonRow>, columns: &[&str]) -> ComparisonSet {
        ComparisonSet { rows, columns: columns.iter().map(|c| c.to_string()).collect() }
    }

    #[test]
    fn blank_cells_become_placeholder() {
        let s = set(
            vec![
                row("T1", "A", &[("Total_Bugs", "3")]),
                row("T1", "B", &[("Total_Bugs", "")]),
                row("T2", "A", &[]),
            ],
            &["Total_Bugs"],
        );
        let p = PivotTable::from_set(&s, "Total_Bugs").unwrap();
        assert_eq!(p.header(), vec!["Test", "A", "B"]);
        assert_eq!(p.grid(), vec![vec!["T1", "3", "-"], vec!["T2", "-", "-"]]);
    }

    #[test]
    fn unknown_metric_is_rejected() {
        let s = set(vec![row("T1", "A", &[])], &["Total_Bugs"]);
        assert!(matches!(
            PivotTable::from_set(&s, "Nope"),
            Err(MetricsError::UnknownMetric { .. })
        ));
    }

    #[test]
    fn duplicate_pair_keeps_later_row() {
        let s = set(
            vec![row("T1", "A", &[("Leaks", "1")]), row("T1", "A", &[("Leaks", "4")])],
            &["Leaks"],
        );
        let p = PivotTable::from_set(&s, "Leaks").unwrap();
        assert_eq!(p.cell("T1", "A"), Some("4"));
    }

    #[test]
    fn wide_table_keeps_fixed_order_and_drops_unknown_columns() {
        let s = set(
            vec![row("T1", "A", &[("Rec_s", "1.5"), ("Total_Time_s", "9.0")])],
            &["Total_Time_s", "Rec_s", "Leaks"],
        );
        let w = WideTable::from_set(&s, &PERFORMANCE_METRICS);
        assert_eq!(w.header, vec!["Test", "Mode", "Total_Time_s", "Rec_s"]);
        assert_eq!(w.rows, vec![vec!["T1", "A", "9.0", "1.5"]]);
    }

    #[test]
    fn available_metrics_excludes_test_and_mode() {
        let s = set(vec![], &["Test", "Leaks", "Total_Bugs"]);
        assert_eq!(available_metrics(&s), vec!["Leaks", "Total_Bugs"]);
    }

    #[test]
    fn pivot_file_name_embeds_metric() {
        assert_eq!(pivot_file_name("Total_Bugs"), "comparison_pivot_Total_Bugs.csv");
    }
}
