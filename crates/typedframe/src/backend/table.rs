//! Backend over the crate's own [`DataFrame`].

use indexmap::{IndexMap, IndexSet};
use serde_json::Value;

use crate::error::{Result, TypedFrameError};
use crate::frame::{self, Cell, Column, DType, DataFrame, Index};
use crate::schema::ExpectedType;

use super::{Backend, Incomparable, IndexInfo, NormalizedType, RealizedValue, TypeNormalizer};

/// Type rules of the table frame.
///
/// Text, lists and mappings are all stored in object columns, so every
/// object-like expected type normalizes to the object marker. A categorical
/// column normalizes to its ordered category labels.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableNormalizer;

impl TypeNormalizer for TableNormalizer {
    type DType = DType;

    fn normalize_actual(dtype: &DType) -> NormalizedType {
        match dtype {
            DType::Int8 => NormalizedType::Int { bits: 8, signed: true },
            DType::Int16 => NormalizedType::Int { bits: 16, signed: true },
            DType::Int32 => NormalizedType::Int { bits: 32, signed: true },
            DType::Int64 => NormalizedType::Int { bits: 64, signed: true },
            DType::UInt8 => NormalizedType::Int { bits: 8, signed: false },
            DType::UInt16 => NormalizedType::Int { bits: 16, signed: false },
            DType::UInt32 => NormalizedType::Int { bits: 32, signed: false },
            DType::UInt64 => NormalizedType::Int { bits: 64, signed: false },
            DType::Float32 => NormalizedType::Float { bits: 32 },
            DType::Float64 => NormalizedType::Float { bits: 64 },
            DType::Boolean => NormalizedType::Boolean,
            DType::Object => NormalizedType::Object,
            DType::Date => NormalizedType::Date,
            DType::DateTime => NormalizedType::DateTime { utc: false },
            DType::DateTimeUtc => NormalizedType::DateTime { utc: true },
            DType::Categorical { categories, .. } => {
                let labels: Option<Vec<String>> = categories
                    .iter()
                    .map(|c| c.as_str().map(str::to_string))
                    .collect();
                match labels {
                    Some(labels) => NormalizedType::Categories(labels),
                    None => NormalizedType::Other(dtype.to_string()),
                }
            }
        }
    }

    fn normalize_expected(expected: &ExpectedType) -> std::result::Result<NormalizedType, Incomparable> {
        if expected.is_object_like() {
            return Ok(NormalizedType::Object);
        }
        if let ExpectedType::Categorical(labels) = expected {
            return Ok(NormalizedType::Categories(labels.clone()));
        }
        NormalizedType::from_scalar(expected).ok_or(Incomparable)
    }
}

/// Backend over [`DataFrame`]: named row index, universal null marker.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableBackend;

impl TableBackend {
    fn column<'a>(frame: &'a DataFrame, name: &str) -> Result<&'a Column> {
        frame.column(name).ok_or_else(|| {
            TypedFrameError::InvalidFrame(format!("no column named '{name}'"))
        })
    }

    fn replace(frame: &mut DataFrame, name: &str, column: Column) -> Result<()> {
        frame.insert_column(name, column)
    }
}

/// Table frame type a declared type is stored as.
fn storage_dtype(target: &ExpectedType) -> DType {
    match target {
        ExpectedType::Int8 => DType::Int8,
        ExpectedType::Int16 => DType::Int16,
        ExpectedType::Int32 => DType::Int32,
        ExpectedType::Int64 => DType::Int64,
        ExpectedType::UInt8 => DType::UInt8,
        ExpectedType::UInt16 => DType::UInt16,
        ExpectedType::UInt32 => DType::UInt32,
        ExpectedType::UInt64 => DType::UInt64,
        ExpectedType::Float32 => DType::Float32,
        ExpectedType::Float64 => DType::Float64,
        ExpectedType::Boolean => DType::Boolean,
        ExpectedType::Utf8 | ExpectedType::List | ExpectedType::Map | ExpectedType::Object => {
            DType::Object
        }
        ExpectedType::Date => DType::Date,
        ExpectedType::DateTime => DType::DateTime,
        ExpectedType::DateTimeUtc => DType::DateTimeUtc,
        ExpectedType::Categorical(labels) => DType::Categorical {
            categories: labels.iter().cloned().map(Value::String).collect(),
            ordered: true,
        },
    }
}

fn realized(cell: &Cell<'_>) -> RealizedValue {
    match cell {
        c if c.is_null() => RealizedValue::Null,
        Cell::Value(Value::String(s)) => RealizedValue::Text(s.clone()),
        other => RealizedValue::Other(other.to_string()),
    }
}

impl Backend for TableBackend {
    type Frame = DataFrame;
    type DType = DType;
    type Normalizer = TableNormalizer;

    const NAME: &'static str = "table";

    fn dtypes(&self, frame: &DataFrame) -> IndexMap<String, DType> {
        frame.dtypes()
    }

    fn cast_column(&self, frame: &mut DataFrame, name: &str, target: &ExpectedType) -> Result<()> {
        let column = Self::column(frame, name)?;
        let cast = frame::cast(column, target)
            .map_err(|reason| TypedFrameError::coercion(name, reason))?;
        Self::replace(frame, name, cast)
    }

    fn to_categorical(&self, frame: &mut DataFrame, name: &str, labels: &[String]) -> Result<()> {
        let column = Self::column(frame, name)?;
        let cast = frame::to_categorical(column, labels)
            .map_err(|reason| TypedFrameError::coercion(name, reason))?;
        Self::replace(frame, name, cast)
    }

    fn supports_null_column(&self, target: &ExpectedType) -> bool {
        // A null-filled categorical would break the no-null categorical invariant.
        !matches!(target, ExpectedType::Categorical(_))
    }

    fn add_null_column(&self, frame: &mut DataFrame, name: &str, target: &ExpectedType) -> Result<()> {
        let column = Column::nulls(&storage_dtype(target), frame.height());
        frame.insert_column(name, column)
    }

    fn index(&self, frame: &DataFrame) -> Option<IndexInfo<DType>> {
        let index = frame.index();
        Some(IndexInfo {
            name: index.name().map(str::to_string),
            dtype: index.dtype(),
        })
    }

    fn set_index(&self, frame: &mut DataFrame, name: &str, target: &ExpectedType) -> Result<()> {
        let values = frame::cast(frame.index().values(), target)
            .map_err(|reason| TypedFrameError::coercion(format!("<index {name}>"), reason))?;
        frame.set_index(Index::new(Some(name.to_string()), values))
    }

    fn distinct_values(&self, frame: &DataFrame, name: &str) -> Vec<RealizedValue> {
        let Some(column) = frame.column(name) else {
            return Vec::new();
        };
        let distinct: IndexSet<RealizedValue> = column.cells().map(|c| realized(&c)).collect();
        distinct.into_iter().collect()
    }

    fn has_null(&self, frame: &DataFrame, name: &str) -> bool {
        frame.column(name).is_some_and(Column::has_null)
    }

    fn categorical_columns(&self, frame: &DataFrame) -> Vec<String> {
        frame
            .columns()
            .filter(|(_, c)| matches!(c, Column::Categorical(_)))
            .map(|(n, _)| n.to_string())
            .collect()
    }

    fn categories_are_strings(&self, frame: &DataFrame, name: &str) -> bool {
        match frame.column(name) {
            Some(Column::Categorical(c)) => c.categories().iter().all(Value::is_string),
            _ => true,
        }
    }
}
