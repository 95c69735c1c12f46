//! CSV statistic tables.
//!
//! The fuzzing tool writes small comma-separated files: one header row, then
//! one row per observation. Fields are quoted only when they contain a comma,
//! a quote or a line break, and a doubled quote escapes a quote. Blank lines
//! carry no record and are skipped.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{CommonError, Result};

/// A parsed statistic file: a header plus its data rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl StatTable {
    /// Read a table from disk. Returns `None` for a file with no records.
    pub fn read(path: &Path) -> Result<Option<Self>> {
        let mut records = read_records(path)?.into_iter();
        Ok(records.next().map(|header| Self { header, rows: records.collect() }))
    }

    /// The first data row (record index 1). Later rows are ignored by the
    /// metric extractor.
    pub fn first_row(&self) -> Option<&[String]> {
        self.rows.first().map(Vec::as_slice)
    }

    /// Position of the column called `name`, if any.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    /// Header/value pairs of the first data row, truncated to the shorter of the two.
    pub fn first_row_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        let row = self.first_row().unwrap_or(&[]);
        self.header.iter().zip(row.iter()).map(|(h, v)| (h.as_str(), v.as_str()))
    }
}

/// Read every record of a CSV file.
pub fn read_records(path: &Path) -> Result<Vec<Vec<String>>> {
    let bytes = std::fs::read(path).map_err(|e| CommonError::io(path, e))?;
    let text = String::from_utf8_lossy(&bytes);
    parse_records(&text).map_err(|(line, message)| CommonError::Csv {
        path: path.to_path_buf(),
        line,
        message,
    })
}

/// Parse CSV text into records.
///
/// On failure returns the 1-based line number and a message.
pub fn parse_records(text: &str) -> std::result::Result<Vec<Vec<String>>, (usize, String)> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut field_started = false;
    let mut line = 1usize;
    let mut quote_line = 0usize;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => {
                in_quotes = true;
                field_started = true;
                quote_line = line;
            }
            ',' => {
                record.push(std::mem::take(&mut field));
                field_started = true;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                if field_started || !field.is_empty() || !record.is_empty() {
                    record.push(std::mem::take(&mut field));
                    records.push(std::mem::take(&mut record));
                }
                field_started = false;
                line += 1;
            }
            _ => {
                field.push(c);
                field_started = true;
            }
        }
    }

    if in_quotes {
        return Err((quote_line, "unterminated quoted field".to_string()));
    }
    if field_started || !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }
    Ok(records)
}

fn needs_quoting(field: &str) -> bool {
    field.contains([',', '"', '\n', '\r'])
}

/// Render one record as a CSV line (without the line terminator).
pub fn format_record<S: AsRef<str>>(fields: &[S]) -> String {
    let mut out = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let field = field.as_ref();
        if needs_quoting(field) {
            out.push('"');
            out.push_str(&field.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(field);
        }
    }
    out
}

/// Buffered CSV writer. Creating one truncates the target file.
pub struct CsvWriter {
    path: PathBuf,
    out: BufWriter<File>,
}

impl CsvWriter {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|e| CommonError::io(path, e))?;
        Ok(Self { path: path.to_path_buf(), out: BufWriter::new(file) })
    }

    pub fn write_record<S: AsRef<str>>(&mut self, fields: &[S]) -> Result<()> {
        writeln!(self.out, "{}", format_record(fields)).map_err(|e| CommonError::io(&self.path, e))
    }

    /// Flush buffered output. Dropping without calling this may lose data silently.
    pub fn finish(mut self) -> Result<()> {
        self.out.flush().map_err(|e| CommonError::io(&self.path, e))
    }
}
