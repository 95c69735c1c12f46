// SPDX-License-Identifier: MIT OR Apache-2.0
//! Metric extraction and comparison tables.
//!
//! One mode's raw statistic files become a [`MetricRecord`] via
//! [`extract`]. The records of every mode of one test form a
//! [`ComparisonTable`] (`comparison.csv`). Across tests, the comparison files
//! are gathered into single-metric [`PivotTable`]s or the fixed
//! performance/precision [`GroupedTables`].

pub mod comparison;
pub mod error;
pub mod extractor;
pub mod pivot;
pub mod record;
pub mod render;
pub mod select;

pub use comparison::{
    COMBINED_DIR, COMPARISON_FILE, ComparisonTable, build_comparison_table, gather_modes,
};
pub use error::{MetricsError, Result};
pub use extractor::{StatCategory, extract, find_stat_file};
pub use pivot::{
    ComparisonRow, ComparisonSet, GroupedTables, PERFORMANCE_FILE, PERFORMANCE_METRICS,
    PIVOT_PLACEHOLDER, PRECISION_FILE, PRECISION_METRICS, PivotTable, WideTable,
    available_metrics, build_grouped_tables, build_pivot, load_comparisons, pivot_file_name,
    write_pivot,
};
pub use record::{MetricRecord, MetricValue, keys};
pub use render::render_table;
pub use select::{MetricSelector, PromptSelector};
