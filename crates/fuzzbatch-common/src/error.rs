//! Error types shared across fuzzbatch crates.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading configuration or handling CSV tables.
#[derive(Debug, Error)]
pub enum CommonError {
    #[error("config file not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    #[error("invalid config yaml '{}': {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed csv in {} at line {line}: {message}", path.display())]
    Csv { path: PathBuf, line: usize, message: String },
}

impl CommonError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

/// Convenience result alias.
pub type Result<T> = std::result::Result<T, CommonError>;
