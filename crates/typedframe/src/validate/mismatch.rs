//! Structured report of a frame that does not match its schema.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::schema::{ColumnTypes, ExpectedType};

/// One declared column the frame fails to satisfy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnMismatch {
    pub column: String,
    pub expected: ExpectedType,
    /// Normalized actual type, `None` when the column is absent.
    pub actual: Option<String>,
}

/// A disagreement between the frame's row index and the declared index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndexMismatch {
    Name {
        expected: String,
        actual: Option<String>,
    },
    Type {
        expected: ExpectedType,
        actual: String,
    },
}

impl fmt::Display for IndexMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexMismatch::Name { expected, actual } => write!(
                f,
                "expected index name {expected}, actual index name {}",
                actual.as_deref().unwrap_or("None")
            ),
            IndexMismatch::Type { expected, actual } => {
                write!(f, "expected index dtype {expected}, actual index dtype {actual}")
            }
        }
    }
}

/// Every way a frame disagrees with the effective schema of a table type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaMismatch {
    /// Name of the table type validated against.
    pub table: String,
    /// Normalized actual type of every column, in frame order.
    pub actual: IndexMap<String, String>,
    /// The full effective schema, optional columns included.
    pub expected: ColumnTypes,
    /// Mismatched declared columns, deduplicated, in schema order.
    pub differences: Vec<ColumnMismatch>,
    pub index: Vec<IndexMismatch>,
}

impl SchemaMismatch {
    pub(crate) fn new(table: &str, actual: IndexMap<String, String>, expected: ColumnTypes) -> Self {
        Self {
            table: table.to_string(),
            actual,
            expected,
            differences: Vec::new(),
            index: Vec::new(),
        }
    }

    /// Record a column mismatch unless the same pair is already recorded.
    pub(crate) fn push_column(&mut self, column: &str, expected: &ExpectedType) {
        if self.contains(column, expected) {
            return;
        }
        self.differences.push(ColumnMismatch {
            column: column.to_string(),
            expected: expected.clone(),
            actual: self.actual.get(column).cloned(),
        });
    }

    pub(crate) fn push_index(&mut self, mismatch: IndexMismatch) {
        self.index.push(mismatch);
    }

    pub fn is_empty(&self) -> bool {
        self.differences.is_empty() && self.index.is_empty()
    }

    /// Whether `(column, expected)` is among the differences.
    pub fn contains(&self, column: &str, expected: &ExpectedType) -> bool {
        self.differences
            .iter()
            .any(|d| d.column == column && &d.expected == expected)
    }

    /// Names of the mismatched columns.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.differences.iter().map(|d| d.column.as_str())
    }
}

impl fmt::Display for SchemaMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dataframe doesn't match schema of '{}'", self.table)?;

        let actual: Vec<String> = self.actual.iter().map(|(k, v)| format!("{k}: {v}")).collect();
        writeln!(f, "Actual: {{{}}}", actual.join(", "))?;

        let expected: Vec<String> = self.expected.iter().map(|(k, v)| format!("{k}: {v}")).collect();
        write!(f, "Expected: {{{}}}", expected.join(", "))?;

        if !self.differences.is_empty() {
            let diff: Vec<String> = self
                .differences
                .iter()
                .map(|d| format!("({}, {})", d.column, d.expected))
                .collect();
            write!(f, "\nDifference: {{{}}}", diff.join(", "))?;
        }
        for mismatch in &self.index {
            write!(f, "\n{mismatch}")?;
        }
        Ok(())
    }
}
