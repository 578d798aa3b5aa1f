//! Delimited text input.

mod reader;

pub use reader::{CsvConfig, CsvReader, is_null_token};
