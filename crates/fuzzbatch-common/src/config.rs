//! Runner configuration loaded from YAML.
//!
//! ```yaml
//! advocate_bin: ./advocate/advocate
//! modes: [GFuzz, GFuzzHB, Flow]
//! max_runs: 100
//! timeout: 60
//! record_time: true
//! record_stats: true
//! results_dir: results
//! log_files: [output.log, results_readable.log]
//! stat_prefixes: [statsAll, statsAnalysis, statsFuzzing, times_total, times_detail]
//! ```
//!
//! Only the keys above are recognized; anything else in the file is ignored.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{CommonError, Result};

/// Environment variable consulted when no explicit config path is given.
pub const CONFIG_ENV_VAR: &str = "FUZZBATCH_CONFIG";

/// Config file looked up in the working directory as a last resort.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Settings shared by every run of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Path to the external fuzzing tool. Relative paths resolve against the
    /// directory holding the config file.
    pub advocate_bin: PathBuf,
    /// Detection strategies, in the order logs are concatenated.
    pub modes: Vec<String>,
    pub max_runs: u32,
    /// Seconds, forwarded to the fuzz, record and replay phases alike.
    pub timeout: u64,
    pub record_time: bool,
    pub record_stats: bool,
    /// Name of the results folder created under each test directory.
    pub results_dir: String,
    /// Log file names merged by the log aggregator.
    pub log_files: Vec<String>,
    /// Stat file prefixes merged by the stat aggregator.
    pub stat_prefixes: Vec<String>,

    #[serde(skip)]
    base_dir: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            advocate_bin: PathBuf::from("./advocate/advocate"),
            modes: Vec::new(),
            max_runs: 100,
            timeout: 60,
            record_time: true,
            record_stats: true,
            results_dir: "results".to_string(),
            log_files: Vec::new(),
            stat_prefixes: Vec::new(),
            base_dir: PathBuf::from("."),
        }
    }
}

impl RunnerConfig {
    /// Pick the config path: explicit argument, then `FUZZBATCH_CONFIG`, then
    /// `./config.yaml`.
    pub fn locate(explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        match env::var(CONFIG_ENV_VAR) {
            Ok(p) if !p.is_empty() => PathBuf::from(p),
            _ => PathBuf::from(DEFAULT_CONFIG_FILE),
        }
    }

    /// Load and parse the config file at `path`.
    ///
    /// A missing file is an error; there is no silent fallback to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(CommonError::ConfigNotFound { path: path.to_path_buf() });
        }
        let text = std::fs::read_to_string(path).map_err(|e| CommonError::io(path, e))?;
        let base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let config = Self::from_yaml_str(&text, base_dir)
            .map_err(|source| CommonError::ConfigParse { path: path.to_path_buf(), source })?;
        debug!(path = %path.display(), modes = ?config.modes, "loaded runner config");
        Ok(config)
    }

    /// Parse YAML text. `base_dir` anchors a relative `advocate_bin`.
    ///
    /// An empty document yields the defaults.
    pub fn from_yaml_str(
        text: &str,
        base_dir: impl Into<PathBuf>,
    ) -> std::result::Result<Self, serde_yaml::Error> {
        let mut config: RunnerConfig = if text.trim().is_empty() {
            RunnerConfig::default()
        } else {
            serde_yaml::from_str::<Option<RunnerConfig>>(text)?.unwrap_or_default()
        };
        config.base_dir = base_dir.into();
        Ok(config)
    }

    /// Builder-style override used by callers that construct configs in code.
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    /// Absolute-or-anchored location of the fuzzing tool.
    pub fn tool_path(&self) -> PathBuf {
        if self.advocate_bin.is_absolute() {
            self.advocate_bin.clone()
        } else {
            self.base_dir.join(&self.advocate_bin)
        }
    }

    /// Whether `mode` is one of the configured modes.
    pub fn knows_mode(&self, mode: &str) -> bool {
        self.modes.iter().any(|m| m == mode)
    }
}
