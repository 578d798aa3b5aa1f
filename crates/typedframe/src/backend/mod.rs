//! Capability interface between the validator and a frame library.
//!
//! A backend exposes the handful of column-level operations the validator
//! needs: reading column types, casting a column, reading and replacing the
//! row index, and inspecting categorical columns. Type equivalence is left
//! to the backend's [`TypeNormalizer`], since frame libraries disagree on how
//! they represent text, generic objects and categoricals.

use std::any::Any;
use std::fmt;

use indexmap::IndexMap;

use crate::error::Result;
use crate::schema::ExpectedType;

#[cfg(feature = "arrow")]
mod arrow;
mod table;

#[cfg(feature = "arrow")]
pub use self::arrow::{ArrowBackend, ArrowDType, ArrowNormalizer};
pub use table::{TableBackend, TableNormalizer};

/// Backend-neutral form that actual and expected types are compared in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NormalizedType {
    Int { bits: u8, signed: bool },
    Float { bits: u8 },
    Boolean,
    String,
    List,
    Map,
    /// The generic object marker.
    Object,
    Date,
    DateTime { utc: bool },
    /// Ordered labels of a categorical type.
    Categories(Vec<String>),
    /// A type with no shared form, rendered by the backend.
    Other(String),
}

impl fmt::Display for NormalizedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizedType::Int { bits, signed: true } => write!(f, "int{bits}"),
            NormalizedType::Int { bits, signed: false } => write!(f, "uint{bits}"),
            NormalizedType::Float { bits } => write!(f, "float{bits}"),
            NormalizedType::Boolean => f.write_str("bool"),
            NormalizedType::String => f.write_str("utf8"),
            NormalizedType::List => f.write_str("list"),
            NormalizedType::Map => f.write_str("map"),
            NormalizedType::Object => f.write_str("object"),
            NormalizedType::Date => f.write_str("date"),
            NormalizedType::DateTime { utc: false } => f.write_str("datetime"),
            NormalizedType::DateTime { utc: true } => f.write_str("datetime[UTC]"),
            NormalizedType::Categories(labels) => write!(f, "categorical[{}]", labels.join(", ")),
            NormalizedType::Other(name) => f.write_str(name),
        }
    }
}

impl NormalizedType {
    /// Shared form of the scalar and temporal expected types.
    ///
    /// Object-like types and categoricals are left to each normalizer.
    pub fn from_scalar(expected: &ExpectedType) -> Option<Self> {
        let normalized = match expected {
            ExpectedType::Int8 => NormalizedType::Int { bits: 8, signed: true },
            ExpectedType::Int16 => NormalizedType::Int { bits: 16, signed: true },
            ExpectedType::Int32 => NormalizedType::Int { bits: 32, signed: true },
            ExpectedType::Int64 => NormalizedType::Int { bits: 64, signed: true },
            ExpectedType::UInt8 => NormalizedType::Int { bits: 8, signed: false },
            ExpectedType::UInt16 => NormalizedType::Int { bits: 16, signed: false },
            ExpectedType::UInt32 => NormalizedType::Int { bits: 32, signed: false },
            ExpectedType::UInt64 => NormalizedType::Int { bits: 64, signed: false },
            ExpectedType::Float32 => NormalizedType::Float { bits: 32 },
            ExpectedType::Float64 => NormalizedType::Float { bits: 64 },
            ExpectedType::Boolean => NormalizedType::Boolean,
            ExpectedType::Date => NormalizedType::Date,
            ExpectedType::DateTime => NormalizedType::DateTime { utc: false },
            ExpectedType::DateTimeUtc => NormalizedType::DateTime { utc: true },
            ExpectedType::Utf8
            | ExpectedType::List
            | ExpectedType::Map
            | ExpectedType::Object
            | ExpectedType::Categorical(_) => return None,
        };
        Some(normalized)
    }
}

/// An expected type that has no counterpart in a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Incomparable;

/// Backend-specific type-equivalence rules.
pub trait TypeNormalizer {
    /// The backend's native column type.
    type DType;

    fn normalize_actual(dtype: &Self::DType) -> NormalizedType;

    fn normalize_expected(expected: &ExpectedType) -> std::result::Result<NormalizedType, Incomparable>;

    /// Incomparable pairs count as mismatches.
    fn types_mismatch(actual: &Self::DType, expected: &ExpectedType) -> bool {
        match Self::normalize_expected(expected) {
            Ok(expected) => Self::normalize_actual(actual) != expected,
            Err(Incomparable) => true,
        }
    }
}

/// Name and type of a frame's row index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexInfo<D> {
    pub name: Option<String>,
    pub dtype: D,
}

/// A distinct realized value of a column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RealizedValue {
    Null,
    Text(String),
    /// A non-text value, rendered by the backend.
    Other(String),
}

impl fmt::Display for RealizedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RealizedValue::Null => f.write_str("null"),
            RealizedValue::Text(s) | RealizedValue::Other(s) => f.write_str(s),
        }
    }
}

/// Column-level capabilities of a frame library.
///
/// Column-level methods taking a `name` may assume the column exists; the
/// validator only calls them for names reported by [`Backend::dtypes`].
pub trait Backend {
    type Frame: Clone + fmt::Debug + 'static;
    type DType: Clone + fmt::Debug + fmt::Display;
    type Normalizer: TypeNormalizer<DType = Self::DType>;

    /// Human-readable backend name for diagnostics.
    const NAME: &'static str;

    /// Column name to actual type, in column order.
    fn dtypes(&self, frame: &Self::Frame) -> IndexMap<String, Self::DType>;

    /// Cast one column in place.
    fn cast_column(&self, frame: &mut Self::Frame, name: &str, target: &ExpectedType) -> Result<()>;

    /// Re-encode one column as an ordered categorical over exactly `labels`.
    fn to_categorical(&self, frame: &mut Self::Frame, name: &str, labels: &[String]) -> Result<()>;

    /// Whether an all-null column of `target` can be represented.
    fn supports_null_column(&self, target: &ExpectedType) -> bool;

    /// Append an all-null column of `target`.
    fn add_null_column(&self, frame: &mut Self::Frame, name: &str, target: &ExpectedType) -> Result<()>;

    /// The row index, or `None` for backends without one.
    fn index(&self, frame: &Self::Frame) -> Option<IndexInfo<Self::DType>>;

    /// Cast the row index to `target` and rename it.
    fn set_index(&self, frame: &mut Self::Frame, name: &str, target: &ExpectedType) -> Result<()>;

    /// Distinct realized values of a column, nulls included, in first-seen order.
    fn distinct_values(&self, frame: &Self::Frame, name: &str) -> Vec<RealizedValue>;

    fn has_null(&self, frame: &Self::Frame, name: &str) -> bool;

    /// Names of all categorical columns in the frame.
    fn categorical_columns(&self, frame: &Self::Frame) -> Vec<String>;

    /// Whether every declared category of a categorical column is a string.
    fn categories_are_strings(&self, frame: &Self::Frame, name: &str) -> bool;

    fn is_backend_frame(&self, value: &dyn Any) -> bool {
        value.is::<Self::Frame>()
    }
}
