use anyhow::Result;
use fuzzbatch_metrics::{available_metrics, load_comparisons};
use fuzzbatch_runner::list_tests;
use std::path::Path;

use crate::output;

pub fn tests(test_dir: &Path, json: bool) -> Result<()> {
    print_names(&list_tests(test_dir)?, json)
}

pub fn metrics(root: &Path, json: bool) -> Result<()> {
    output::require_dir(root)?;
    let set = load_comparisons(root)?;
    print_names(&available_metrics(&set), json)
}

fn print_names(names: &[String], json: bool) -> Result<()> {
    if json {
        return output::print_json(&names);
    }
    for name in names {
        println!("{name}");
    }
    Ok(())
}
