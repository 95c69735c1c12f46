//! Orchestration errors.

use fuzzbatch_common::CommonError;
use fuzzbatch_metrics::MetricsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("test directory does not exist or is not a directory: {}", path.display())]
    InvalidTestDir { path: PathBuf },

    #[error("no test functions found in {}", dir.display())]
    NoTests { dir: PathBuf },

    #[error("no modes configured")]
    NoModes,

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Common(#[from] CommonError),

    #[error(transparent)]
    Metrics(#[from] MetricsError),
}

impl RunnerError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, RunnerError>;
