//! Normalized metric records.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Metric names produced by the extractor.
pub mod keys {
    pub const UNIQUE_BUGS: &str = "Unique_Bugs";
    pub const BUG_TYPES: &str = "Bug_Types";
    pub const TOTAL_BUGS: &str = "Total_Bugs";
    pub const LEAKS: &str = "Leaks";
    pub const PANICS: &str = "Panics";
    pub const CONFIRMED_REPLAYS: &str = "Confirmed_Replays";
    pub const TOTAL_RUNS: &str = "Total_Runs";
    pub const REPLAYS_WRITTEN: &str = "Replays_Written";
    pub const REPLAYS_SUCCESSFUL: &str = "Replays_Successful";
    pub const TOTAL_TIME_S: &str = "Total_Time_s";
    pub const REC_S: &str = "Rec_s";
    pub const ANA_S: &str = "Ana_s";
    pub const REP_S: &str = "Rep_s";
    pub const BUGS_PER_1000_RUNS: &str = "Bugs_per_1000_Runs";
    pub const BUGS_PER_MINUTE: &str = "Bugs_per_Minute";
    pub const RUNS_PER_MINUTE: &str = "Runs_per_Minute";
}

/// A single metric cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Int(i64),
    Real(f64),
    Text(String),
}

impl MetricValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Real(v) => Some(*v),
            Self::Text(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for MetricValue {
    /// Reals always carry a decimal point so `5.0` stays distinguishable from `5`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Real(v) if v.is_finite() && v.fract() == 0.0 => write!(f, "{v:.1}"),
            Self::Real(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for MetricValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<String> for MetricValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// Metrics for one (test, mode) pair. Keys iterate in sorted order.
///
/// A metric whose source file was absent is simply not present; it is never
/// filled with zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MetricRecord(BTreeMap<String, MetricValue>);

impl MetricRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: impl Into<MetricValue>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&MetricValue> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetricValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Cell text for `key`, empty when the metric is absent.
    pub fn cell(&self, key: &str) -> String {
        self.get(key).map(ToString::to_string).unwrap_or_default()
    }
}
