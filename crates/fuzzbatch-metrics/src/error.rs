//! Metric extraction errors.

use fuzzbatch_common::CommonError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
    /// A positional read found the wrong column name, or too few columns.
    #[error(
        "schema mismatch in {}: column {column} should be '{expected}', found {}",
        file.display(),
        found.as_deref().map(|f| format!("'{f}'")).unwrap_or_else(|| "nothing".to_string())
    )]
    SchemaMismatch { file: PathBuf, column: usize, expected: String, found: Option<String> },

    #[error("invalid value '{value}' for column '{column}' in {}", file.display())]
    InvalidValue { file: PathBuf, column: String, value: String },

    #[error("no comparison.csv found under {}", root.display())]
    NoComparisons { root: PathBuf },

    #[error("unknown metric '{metric}'")]
    UnknownMetric { metric: String },

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Common(#[from] CommonError),
}

impl MetricsError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, MetricsError>;
