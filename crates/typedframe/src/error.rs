//! Error types for the typedframe library.

use std::path::PathBuf;

use thiserror::Error;

use crate::validate::SchemaMismatch;

/// Main error type for typedframe operations.
#[derive(Debug, Error)]
pub enum TypedFrameError {
    /// The frame's columns or index disagree with the schema.
    #[error("{0}")]
    SchemaMismatch(Box<SchemaMismatch>),

    /// A categorical column breaks the categorical invariants.
    #[error("Categorical column '{column}' {violation}")]
    CategoricalInvariant {
        column: String,
        violation: CategoricalViolation,
    },

    /// A column or the index could not be coerced to its declared type.
    #[error("Failed to convert column '{column}': {reason}")]
    Coercion {
        column: String,
        reason: CoercionReason,
    },

    /// The value passed in is not a frame of the active backend.
    #[error("Input argument of type {actual} is not an instance of {backend} frame")]
    BackendType {
        backend: &'static str,
        actual: String,
    },

    /// Invalid schema declaration.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A frame whose columns or index do not line up.
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    /// Empty file or no data.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Error raised by the arrow kernels.
    #[cfg(feature = "arrow")]
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

impl From<SchemaMismatch> for TypedFrameError {
    fn from(mismatch: SchemaMismatch) -> Self {
        TypedFrameError::SchemaMismatch(Box::new(mismatch))
    }
}

/// Why a categorical column was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CategoricalViolation {
    #[error("must have str categories")]
    NonStringCategories,
    #[error("must not have null values")]
    NullValues,
}

/// Why a value could not be coerced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoercionReason {
    /// Realized values outside the declared categories.
    #[error("unknown categories {}", .0.join(", "))]
    UnknownCategories(Vec<String>),

    /// A value that has no representation in the target type.
    #[error("value '{value}' is not representable as {target}")]
    Unrepresentable { value: String, target: String },

    /// The backend has no cast between the two types.
    #[error("cannot cast {from} to {target}")]
    Unsupported { from: String, target: String },

    /// The backend keeps no row index to cast or rename.
    #[error("backend has no row index")]
    NoIndex,

    /// A backend kernel refused the cast.
    #[error("{0}")]
    Rejected(String),
}

/// Errors in schema declarations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Parents admit no consistent linearization.
    #[error("cannot linearize the parents of '{table}'")]
    InconsistentHierarchy { table: String },

    /// The same parent appears twice in one parent list.
    #[error("'{table}' lists parent '{parent}' more than once")]
    DuplicateParent { table: String, parent: String },

    /// A declaration references a table that is not declared.
    #[error("'{table}' references unknown parent '{parent}'")]
    UnknownParent { table: String, parent: String },

    /// Two declarations share one name.
    #[error("table '{0}' is declared more than once")]
    DuplicateTable(String),

    /// Declarations reference each other in a cycle.
    #[error("inheritance cycle through '{0}'")]
    Cycle(String),
}

/// Result type alias for typedframe operations.
pub type Result<T> = std::result::Result<T, TypedFrameError>;

impl TypedFrameError {
    pub(crate) fn coercion(column: impl Into<String>, reason: CoercionReason) -> Self {
        TypedFrameError::Coercion {
            column: column.into(),
            reason,
        }
    }

    /// The mismatch report, for schema mismatches.
    pub fn as_schema_mismatch(&self) -> Option<&SchemaMismatch> {
        match self {
            TypedFrameError::SchemaMismatch(mismatch) => Some(mismatch),
            _ => None,
        }
    }
}
