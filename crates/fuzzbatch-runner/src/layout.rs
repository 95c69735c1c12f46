//! Where a batch reads and writes on disk.
//!
//! The tool writes into one output directory per test directory. That
//! location is carried here explicitly and handed to the collector, so a
//! caller that gives each run its own output directory gets isolated runs.

use std::path::{Path, PathBuf};

use crate::error::{Result, RunnerError};

/// Directory the tool writes into, relative to the test directory.
pub const DEFAULT_OUTPUT_DIR: &str = "advocateResult";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLayout {
    test_dir: PathBuf,
    output_dir: PathBuf,
    results_root: PathBuf,
}

impl RunLayout {
    /// Resolve `test_dir` to an absolute path and derive the default layout.
    pub fn new(test_dir: &Path, results_dir: &str) -> Result<Self> {
        if !test_dir.is_dir() {
            return Err(RunnerError::InvalidTestDir { path: test_dir.to_path_buf() });
        }
        let test_dir = test_dir.canonicalize().map_err(|e| RunnerError::io(test_dir, e))?;
        Ok(Self {
            output_dir: test_dir.join(DEFAULT_OUTPUT_DIR),
            results_root: test_dir.join(results_dir),
            test_dir,
        })
    }

    /// Point the collector at a different tool output directory.
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn test_dir(&self) -> &Path {
        &self.test_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `<testDir>/<results_dir>`, parent of every per-test results directory.
    pub fn results_root(&self) -> &Path {
        &self.results_root
    }

    pub fn test_results_dir(&self, test: &str) -> PathBuf {
        self.results_root.join(test)
    }

    pub fn mode_results_dir(&self, test: &str, mode: &str) -> PathBuf {
        self.test_results_dir(test).join(mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_paths() {
        let dir = tempfile::tempdir().unwrap();
        let layout = RunLayout::new(dir.path(), "results").unwrap();
        let abs = dir.path().canonicalize().unwrap();
        assert_eq!(layout.test_dir(), abs);
        assert_eq!(layout.output_dir(), abs.join("advocateResult"));
        assert_eq!(layout.mode_results_dir("TestX", "GFuzz"), abs.join("results/TestX/GFuzz"));
    }

    #[test]
    fn output_dir_override() {
        let dir = tempfile::tempdir().unwrap();
        let layout = RunLayout::new(dir.path(), "out").unwrap().with_output_dir("/tmp/run-1");
        assert_eq!(layout.output_dir(), Path::new("/tmp/run-1"));
        assert!(layout.results_root().ends_with("out"));
    }

    #[test]
    fn file_is_not_a_test_dir() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("x_test.go");
        std::fs::write(&file, "").unwrap();
        assert!(matches!(RunLayout::new(&file, "results"), Err(RunnerError::InvalidTestDir { .. })));
    }
}
