//! Test target discovery.
//!
//! Scans the `*_test.go` files directly inside a directory for top-level
//! `func TestXxx(` declarations.

use regex::Regex;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, warn};

use crate::error::{Result, RunnerError};

const TEST_FILE_SUFFIX: &str = "_test.go";

static TEST_FUNC: OnceLock<Regex> = OnceLock::new();

fn test_func_re() -> &'static Regex {
    TEST_FUNC.get_or_init(|| {
        Regex::new(r"^\s*func\s+(Test\w+)\s*\(").expect("internal test pattern must compile")
    })
}

/// Test function names declared in one source file, in file order.
pub fn tests_in_source(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| test_func_re().captures(line))
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Sorted, deduplicated test names found in `dir`. Not recursive.
pub fn list_tests(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Err(RunnerError::InvalidTestDir { path: dir.to_path_buf() });
    }
    let entries = std::fs::read_dir(dir).map_err(|e| RunnerError::io(dir, e))?;

    let mut tests = BTreeSet::new();
    for entry in entries {
        let entry = entry.map_err(|e| RunnerError::io(dir, e))?;
        let path = entry.path();
        let is_test_file = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(TEST_FILE_SUFFIX));
        if !is_test_file || !path.is_file() {
            continue;
        }
        match std::fs::read(&path) {
            Ok(bytes) => {
                let found = tests_in_source(&String::from_utf8_lossy(&bytes));
                debug!(file = %path.display(), count = found.len(), "scanned test file");
                tests.extend(found);
            }
            Err(e) => warn!(file = %path.display(), error = %e, "skipping unreadable test file"),
        }
    }
    Ok(tests.into_iter().collect())
}
