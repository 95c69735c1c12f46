//! Choosing a metric for a pivot table.
//!
//! The list of candidates comes from [`crate::available_metrics`]; how one is
//! picked is up to the [`MetricSelector`] the caller injects. The CLI uses a
//! numbered stdin prompt unless `--metric` was given.

use std::io::{BufRead, Write};

/// Picks one metric out of the available names.
pub trait MetricSelector {
    /// Returns `Ok(None)` when the input does not name a valid choice.
    fn select(&mut self, available: &[String]) -> std::io::Result<Option<String>>;
}

/// Numbered menu read from a line-oriented input.
pub struct PromptSelector<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptSelector<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> MetricSelector for PromptSelector<R, W> {
    fn select(&mut self, available: &[String]) -> std::io::Result<Option<String>> {
        writeln!(self.output, "Available metrics:")?;
        for (i, metric) in available.iter().enumerate() {
            writeln!(self.output, "{}) {metric}", i + 1)?;
        }
        write!(self.output, "Select metric by number: ")?;
        self.output.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line)?;
        let choice = line.trim().parse::<usize>().ok();
        Ok(choice
            .filter(|n| (1..=available.len()).contains(n))
            .map(|n| available[n - 1].clone()))
    }
}

impl<F> MetricSelector for F
where
    F: FnMut(&[String]) -> Option<String>,
{
    fn select(&mut self, available: &[String]) -> std::io::Result<Option<String>> {
        Ok(self(available))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn metrics() -> Vec<String> {
        vec!["Leaks".into(), "Total_Bugs".into()]
    }

    #[test]
    fn numbered_choice_is_returned() {
        let mut out = Vec::new();
        let mut sel = PromptSelector::new(Cursor::new("2\n"), &mut out);
        assert_eq!(sel.select(&metrics()).unwrap(), Some("Total_Bugs".to_string()));
        let shown = String::from_utf8(out).unwrap();
        assert!(shown.contains("1) Leaks"));
        assert!(shown.contains("2) Total_Bugs"));
    }

    #[test]
    fn out_of_range_or_garbage_is_none() {
        for input in ["0\n", "3\n", "abc\n", "\n", ""] {
            let mut sel = PromptSelector::new(Cursor::new(input), Vec::new());
            assert_eq!(sel.select(&metrics()).unwrap(), None, "input {input:?}");
        }
    }

    #[test]
    fn closures_are_selectors() {
        let mut pick_last = |m: &[String]| m.last().cloned();
        assert_eq!(pick_last.select(&metrics()).unwrap(), Some("Total_Bugs".to_string()));
    }
}
