//! CSV/TSV reader with delimiter detection.
//!
//! Every column is loaded as untyped text; pass the frame through
//! [`Validator::convert`](crate::Validator::convert) to type it.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde_json::Value;

use crate::error::{Result, TypedFrameError};
use crate::frame::{Column, DataFrame};

/// Delimiters to try when auto-detecting.
const DELIMITERS: &[u8] = &[b'\t', b',', b';', b'|'];

/// Reader configuration.
#[derive(Debug, Clone)]
pub struct CsvConfig {
    /// Delimiter to use (None = auto-detect).
    pub delimiter: Option<u8>,
    /// Whether the file has a header row.
    pub has_header: bool,
    /// Maximum rows to read (None = all).
    pub max_rows: Option<usize>,
    /// Quote character.
    pub quote: u8,
    /// Read NA-like tokens as nulls.
    pub null_tokens: bool,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            has_header: true,
            max_rows: None,
            quote: b'"',
            null_tokens: true,
        }
    }
}

/// Reads delimited files into text-typed frames.
pub struct CsvReader {
    config: CsvConfig,
}

impl CsvReader {
    /// Create a reader with default configuration.
    pub fn new() -> Self {
        Self {
            config: CsvConfig::default(),
        }
    }

    /// Create a reader with custom configuration.
    pub fn with_config(config: CsvConfig) -> Self {
        Self { config }
    }

    /// Read a file into a frame.
    pub fn read_file(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        let contents = fs::read(path).map_err(|e| TypedFrameError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        log::debug!("read {} bytes from '{}'", contents.len(), path.display());
        self.read_bytes(&contents)
    }

    /// Read in-memory bytes into a frame.
    pub fn read_bytes(&self, bytes: &[u8]) -> Result<DataFrame> {
        let delimiter = match self.config.delimiter {
            Some(d) => d,
            None => detect_delimiter(bytes)?,
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(self.config.has_header)
            .quote(self.config.quote)
            .flexible(true)
            .from_reader(bytes);

        let mut headers: Vec<String> = if self.config.has_header {
            reader.headers()?.iter().map(|s| s.to_string()).collect()
        } else {
            Vec::new()
        };

        let mut cells: Vec<Vec<Value>> = vec![Vec::new(); headers.len()];
        for (row_idx, result) in reader.records().enumerate() {
            if self.config.max_rows.is_some_and(|max| row_idx >= max) {
                break;
            }

            let record = result?;
            if headers.is_empty() {
                headers = (0..record.len())
                    .map(|i| format!("column_{}", i + 1))
                    .collect();
                cells = vec![Vec::new(); headers.len()];
            }

            // Short rows are padded with nulls; extra fields are dropped.
            for (col_idx, column) in cells.iter_mut().enumerate() {
                let value = match record.get(col_idx) {
                    Some(raw) if !(self.config.null_tokens && is_null_token(raw)) => {
                        Value::String(raw.to_string())
                    }
                    _ => Value::Null,
                };
                column.push(value);
            }
        }

        if headers.is_empty() {
            return Err(TypedFrameError::EmptyData("No columns found".to_string()));
        }

        let columns: Vec<(String, Column)> = headers
            .into_iter()
            .zip(cells)
            .map(|(name, values)| (name, Column::Object(values)))
            .collect();
        DataFrame::new(columns)
    }
}

impl Default for CsvReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Check if a value represents a missing/null value.
pub fn is_null_token(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("na")
        || trimmed.eq_ignore_ascii_case("n/a")
        || trimmed.eq_ignore_ascii_case("nan")
        || trimmed.eq_ignore_ascii_case("null")
        || trimmed.eq_ignore_ascii_case("none")
        || trimmed.eq_ignore_ascii_case("nil")
        || trimmed == "."
        || trimmed == "-"
}

/// Detect the delimiter by analyzing the first few lines.
fn detect_delimiter(bytes: &[u8]) -> Result<u8> {
    let reader = BufReader::new(bytes);
    let lines: Vec<String> = reader
        .lines()
        .take(10)
        .filter_map(|l| l.ok())
        .filter(|l| !l.trim().is_empty())
        .collect();

    if lines.is_empty() {
        return Err(TypedFrameError::EmptyData("No lines to read".to_string()));
    }

    let mut best_delimiter = b',';
    let mut best_score = 0;

    for &delim in DELIMITERS {
        let counts: Vec<usize> = lines
            .iter()
            .map(|line| count_delimiter_in_line(line, delim))
            .collect();

        let first_count = counts[0];
        if first_count == 0 {
            continue;
        }

        let consistent = counts.iter().all(|&c| c == first_count);
        let variance: f64 = if counts.len() > 1 {
            let mean = counts.iter().sum::<usize>() as f64 / counts.len() as f64;
            counts.iter().map(|&c| (c as f64 - mean).powi(2)).sum::<f64>() / counts.len() as f64
        } else {
            0.0
        };

        // Tab wins ties; it rarely occurs inside values.
        let score = if consistent {
            first_count * 1000 + (if delim == b'\t' { 100 } else { 0 })
        } else if variance < 1.0 {
            first_count * 100
        } else {
            first_count
        };

        if score > best_score {
            best_score = score;
            best_delimiter = delim;
        }
    }

    Ok(best_delimiter)
}

/// Count delimiter occurrences in a line, respecting quotes.
fn count_delimiter_in_line(line: &str, delimiter: u8) -> usize {
    let delim_char = delimiter as char;
    let mut count = 0;
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c == delim_char && !in_quotes => count += 1,
            _ => {}
        }
    }

    count
}
