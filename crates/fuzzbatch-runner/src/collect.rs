//! Moving one run's output into the results tree.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{Result, RunnerError};
use crate::layout::RunLayout;

/// Move the tool's output for (`test`, `mode`) into its results directory.
///
/// Returns the results directory. Safe to repeat: entries already present at
/// the destination are replaced.
pub fn collect(layout: &RunLayout, test: &str, mode: &str) -> Result<PathBuf> {
    let dest = layout.mode_results_dir(test, mode);
    let moved = move_entries(layout.output_dir(), &dest)?;
    info!(test, mode, entries = moved, dest = %dest.display(), "collected run output");
    Ok(dest)
}

/// Move every entry of `source` into `dest`, then try to remove `source`.
///
/// A missing `source` moves nothing. Returns the number of entries moved.
pub fn move_entries(source: &Path, dest: &Path) -> Result<usize> {
    fs::create_dir_all(dest).map_err(|e| RunnerError::io(dest, e))?;
    if !source.is_dir() {
        debug!(source = %source.display(), "no tool output to collect");
        return Ok(0);
    }

    let entries = fs::read_dir(source).map_err(|e| RunnerError::io(source, e))?;
    let mut moved = 0;
    for entry in entries {
        let entry = entry.map_err(|e| RunnerError::io(source, e))?;
        let from = entry.path();
        let to = dest.join(entry.file_name());
        remove_existing(&to).map_err(|e| RunnerError::io(&to, e))?;
        if let Err(e) = fs::rename(&from, &to) {
            debug!(from = %from.display(), error = %e, "rename failed, copying instead");
            copy_recursive(&from, &to).map_err(|e| RunnerError::io(&from, e))?;
            remove_existing(&from).map_err(|e| RunnerError::io(&from, e))?;
        }
        moved += 1;
    }

    if let Err(e) = fs::remove_dir(source) {
        warn!(source = %source.display(), error = %e, "could not remove tool output directory");
    }
    Ok(moved)
}

fn remove_existing(path: &Path) -> io::Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

fn copy_recursive(from: &Path, to: &Path) -> io::Result<()> {
    if !from.is_dir() {
        fs::copy(from, to)?;
        return Ok(());
    }
    for entry in WalkDir::new(from) {
        let entry = entry.map_err(io::Error::from)?;
        let rel = entry.path().strip_prefix(from).map_err(io::Error::other)?;
        let target = to.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
