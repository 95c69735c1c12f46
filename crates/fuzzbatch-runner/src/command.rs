//! Command line for one tool invocation.

use fuzzbatch_common::RunnerConfig;
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::process::Command;

use crate::layout::RunLayout;

/// Everything needed to run the tool for one (test, mode) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: PathBuf,
    /// Absolute test directory, passed as `-path`.
    pub test_dir: PathBuf,
    pub test: String,
    pub mode: String,
    pub max_runs: u32,
    /// Seconds; the same value is used for the fuzz, record and replay phases.
    pub timeout: u64,
    pub record_time: bool,
    pub record_stats: bool,
}

impl ToolInvocation {
    pub fn new(config: &RunnerConfig, layout: &RunLayout, test: &str, mode: &str) -> Self {
        Self {
            program: config.tool_path(),
            test_dir: layout.test_dir().to_path_buf(),
            test: test.to_string(),
            mode: mode.to_string(),
            max_runs: config.max_runs,
            timeout: config.timeout,
            record_time: config.record_time,
            record_stats: config.record_stats,
        }
    }

    /// Arguments after the program name, in the order the tool expects.
    pub fn args(&self) -> Vec<OsString> {
        let timeout = self.timeout.to_string();
        let mut args: Vec<OsString> = vec![
            "fuzzing".into(),
            "-path".into(),
            self.test_dir.clone().into_os_string(),
            "-exec".into(),
            self.test.clone().into(),
            "-fuzzingMode".into(),
            self.mode.clone().into(),
            "-prog".into(),
            self.test.clone().into(),
            "-maxFuzzingRun".into(),
            self.max_runs.to_string().into(),
            "-timeoutFuz".into(),
            timeout.clone().into(),
            "-timeoutRec".into(),
            timeout.clone().into(),
            "-timeoutRep".into(),
            timeout.into(),
        ];
        if self.record_time {
            args.push("-time".into());
        }
        if self.record_stats {
            args.push("-stats".into());
        }
        args
    }

    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.args());
        cmd
    }
}

impl fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in self.args() {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}
