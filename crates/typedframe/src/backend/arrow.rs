//! Backend over arrow [`RecordBatch`]es.
//!
//! Arrow keeps no row index and no generic object type: index specs can
//! never be satisfied here, and `object` columns are incomparable.
//! Categoricals are string-valued dictionary arrays.

use std::fmt;
use std::sync::Arc;

use ::arrow::array::{
    Array, ArrayRef, AsArray, DictionaryArray, Int32Array, StringArray, new_null_array,
};
use ::arrow::compute::{CastOptions, can_cast_types, cast_with_options};
use ::arrow::datatypes::{DataType, Field, FieldRef, Int32Type, Schema, TimeUnit};
use ::arrow::record_batch::{RecordBatch, RecordBatchOptions};
use ::arrow::util::display::array_value_to_string;
use indexmap::{IndexMap, IndexSet};

use crate::error::{CoercionReason, Result, TypedFrameError};
use crate::schema::ExpectedType;

use super::{Backend, Incomparable, IndexInfo, NormalizedType, RealizedValue, TypeNormalizer};

/// Arrow column type, plus the labels of a string dictionary.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrowDType {
    pub data_type: DataType,
    pub categories: Option<Vec<String>>,
}

impl ArrowDType {
    pub fn new(data_type: DataType) -> Self {
        Self {
            data_type,
            categories: None,
        }
    }

    fn of(array: &ArrayRef) -> Self {
        Self {
            data_type: array.data_type().clone(),
            categories: dictionary_labels(array),
        }
    }
}

impl fmt::Display for ArrowDType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.categories {
            Some(labels) => write!(f, "dictionary[{}]", labels.join(", ")),
            None => write!(f, "{:?}", self.data_type),
        }
    }
}

/// Type rules of arrow arrays.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrowNormalizer;

impl TypeNormalizer for ArrowNormalizer {
    type DType = ArrowDType;

    fn normalize_actual(dtype: &ArrowDType) -> NormalizedType {
        match &dtype.data_type {
            DataType::Int8 => NormalizedType::Int { bits: 8, signed: true },
            DataType::Int16 => NormalizedType::Int { bits: 16, signed: true },
            DataType::Int32 => NormalizedType::Int { bits: 32, signed: true },
            DataType::Int64 => NormalizedType::Int { bits: 64, signed: true },
            DataType::UInt8 => NormalizedType::Int { bits: 8, signed: false },
            DataType::UInt16 => NormalizedType::Int { bits: 16, signed: false },
            DataType::UInt32 => NormalizedType::Int { bits: 32, signed: false },
            DataType::UInt64 => NormalizedType::Int { bits: 64, signed: false },
            DataType::Float32 => NormalizedType::Float { bits: 32 },
            DataType::Float64 => NormalizedType::Float { bits: 64 },
            DataType::Boolean => NormalizedType::Boolean,
            DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => NormalizedType::String,
            DataType::List(_) | DataType::LargeList(_) | DataType::FixedSizeList(_, _) => {
                NormalizedType::List
            }
            DataType::Map(_, _) => NormalizedType::Map,
            DataType::Date32 | DataType::Date64 => NormalizedType::Date,
            // The time unit is storage detail; only the zone is compared.
            DataType::Timestamp(_, None) => NormalizedType::DateTime { utc: false },
            DataType::Timestamp(_, Some(tz)) if is_utc(tz) => NormalizedType::DateTime { utc: true },
            DataType::Dictionary(_, _) => match &dtype.categories {
                Some(labels) => NormalizedType::Categories(labels.clone()),
                None => NormalizedType::Other(dtype.to_string()),
            },
            _ => NormalizedType::Other(dtype.to_string()),
        }
    }

    fn normalize_expected(expected: &ExpectedType) -> std::result::Result<NormalizedType, Incomparable> {
        match expected {
            ExpectedType::Utf8 => Ok(NormalizedType::String),
            ExpectedType::List => Ok(NormalizedType::List),
            ExpectedType::Map => Ok(NormalizedType::Map),
            ExpectedType::Object => Err(Incomparable),
            ExpectedType::Categorical(labels) => Ok(NormalizedType::Categories(labels.clone())),
            scalar => NormalizedType::from_scalar(scalar).ok_or(Incomparable),
        }
    }
}

fn is_utc(tz: &str) -> bool {
    matches!(tz, "UTC" | "utc" | "Z" | "+00:00" | "Etc/UTC")
}

fn is_string_type(data_type: &DataType) -> bool {
    matches!(data_type, DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View)
}

fn is_text(data_type: &DataType) -> bool {
    match data_type {
        DataType::Dictionary(_, values) => is_string_type(values),
        other => is_string_type(other),
    }
}

/// Labels of a dictionary array whose values are non-null strings.
fn dictionary_labels(array: &ArrayRef) -> Option<Vec<String>> {
    let dictionary = array.as_any_dictionary_opt()?;
    let values = dictionary.values();
    if !is_string_type(values.data_type()) || values.null_count() > 0 {
        return None;
    }
    let values = cast_with_options(values.as_ref(), &DataType::Utf8, &strict()).ok()?;
    values
        .as_string::<i32>()
        .iter()
        .map(|s| s.map(str::to_string))
        .collect()
}

/// Arrow type a declared type is cast to, where one exists.
fn target_type(expected: &ExpectedType) -> Option<DataType> {
    let data_type = match expected {
        ExpectedType::Int8 => DataType::Int8,
        ExpectedType::Int16 => DataType::Int16,
        ExpectedType::Int32 => DataType::Int32,
        ExpectedType::Int64 => DataType::Int64,
        ExpectedType::UInt8 => DataType::UInt8,
        ExpectedType::UInt16 => DataType::UInt16,
        ExpectedType::UInt32 => DataType::UInt32,
        ExpectedType::UInt64 => DataType::UInt64,
        ExpectedType::Float32 => DataType::Float32,
        ExpectedType::Float64 => DataType::Float64,
        ExpectedType::Boolean => DataType::Boolean,
        ExpectedType::Utf8 => DataType::Utf8,
        ExpectedType::Date => DataType::Date32,
        ExpectedType::DateTime => DataType::Timestamp(TimeUnit::Nanosecond, None),
        ExpectedType::DateTimeUtc => DataType::Timestamp(TimeUnit::Nanosecond, Some("UTC".into())),
        // Lists and maps need an element type the declaration does not carry.
        ExpectedType::List
        | ExpectedType::Map
        | ExpectedType::Object
        | ExpectedType::Categorical(_) => return None,
    };
    Some(data_type)
}

/// Casts fail on the first unrepresentable value instead of producing nulls.
fn strict() -> CastOptions<'static> {
    CastOptions {
        safe: false,
        ..Default::default()
    }
}

/// Backend over [`RecordBatch`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrowBackend;

impl ArrowBackend {
    fn array(batch: &RecordBatch, name: &str) -> Result<ArrayRef> {
        batch
            .column_by_name(name)
            .cloned()
            .ok_or_else(|| TypedFrameError::InvalidFrame(format!("no column named '{name}'")))
    }

    /// Replace the column `name`, or append it when absent.
    fn replace(batch: &mut RecordBatch, name: &str, array: ArrayRef) -> Result<()> {
        let schema = batch.schema();
        let mut fields: Vec<FieldRef> = schema.fields().iter().cloned().collect();
        let mut columns = batch.columns().to_vec();
        let field = Arc::new(Field::new(name, array.data_type().clone(), true));
        match schema.index_of(name) {
            Ok(i) => {
                fields[i] = field;
                columns[i] = array;
            }
            Err(_) => {
                fields.push(field);
                columns.push(array);
            }
        }
        let schema = Schema::new_with_metadata(fields, schema.metadata().clone());
        let options = RecordBatchOptions::new().with_row_count(Some(batch.num_rows()));
        *batch = RecordBatch::try_new_with_options(Arc::new(schema), columns, &options)?;
        Ok(())
    }

    fn unsupported(name: &str, from: &ArrowDType, target: &ExpectedType) -> TypedFrameError {
        TypedFrameError::coercion(
            name,
            CoercionReason::Unsupported {
                from: from.to_string(),
                target: target.to_string(),
            },
        )
    }
}

impl Backend for ArrowBackend {
    type Frame = RecordBatch;
    type DType = ArrowDType;
    type Normalizer = ArrowNormalizer;

    const NAME: &'static str = "arrow";

    fn dtypes(&self, batch: &RecordBatch) -> IndexMap<String, ArrowDType> {
        batch
            .schema()
            .fields()
            .iter()
            .zip(batch.columns())
            .map(|(field, array)| (field.name().clone(), ArrowDType::of(array)))
            .collect()
    }

    fn cast_column(&self, batch: &mut RecordBatch, name: &str, target: &ExpectedType) -> Result<()> {
        if let ExpectedType::Categorical(labels) = target {
            return self.to_categorical(batch, name, labels);
        }
        let array = Self::array(batch, name)?;
        let current = ArrowDType::of(&array);
        if !ArrowNormalizer::types_mismatch(&current, target) {
            return Ok(());
        }
        let to = match target_type(target) {
            Some(to) if can_cast_types(array.data_type(), &to) => to,
            _ => return Err(Self::unsupported(name, &current, target)),
        };
        let cast = cast_with_options(array.as_ref(), &to, &strict()).map_err(|e| {
            TypedFrameError::coercion(name, CoercionReason::Rejected(e.to_string()))
        })?;
        Self::replace(batch, name, cast)
    }

    fn to_categorical(&self, batch: &mut RecordBatch, name: &str, labels: &[String]) -> Result<()> {
        let array = Self::array(batch, name)?;
        let unknown: IndexSet<String> = self
            .distinct_values(batch, name)
            .into_iter()
            .filter(|value| !matches!(value, RealizedValue::Text(s) if labels.contains(s)))
            .map(|value| value.to_string())
            .collect();
        if !unknown.is_empty() {
            return Err(TypedFrameError::coercion(
                name,
                CoercionReason::UnknownCategories(unknown.into_iter().collect()),
            ));
        }

        let text = cast_with_options(array.as_ref(), &DataType::Utf8, &strict())?;
        let keys: Int32Array = text
            .as_string::<i32>()
            .iter()
            .map(|value| value.and_then(|s| labels.iter().position(|l| l == s)).map(|p| p as i32))
            .collect();
        let values: ArrayRef = Arc::new(StringArray::from(labels.to_vec()));
        let dictionary = DictionaryArray::<Int32Type>::try_new(keys, values)?;
        Self::replace(batch, name, Arc::new(dictionary))
    }

    fn supports_null_column(&self, target: &ExpectedType) -> bool {
        target_type(target).is_some()
    }

    fn add_null_column(&self, batch: &mut RecordBatch, name: &str, target: &ExpectedType) -> Result<()> {
        let Some(data_type) = target_type(target) else {
            return Err(Self::unsupported(name, &ArrowDType::new(DataType::Null), target));
        };
        let nulls = new_null_array(&data_type, batch.num_rows());
        Self::replace(batch, name, nulls)
    }

    fn index(&self, _batch: &RecordBatch) -> Option<IndexInfo<ArrowDType>> {
        None
    }

    fn set_index(&self, _batch: &mut RecordBatch, name: &str, _target: &ExpectedType) -> Result<()> {
        Err(TypedFrameError::coercion(format!("<index {name}>"), CoercionReason::NoIndex))
    }

    fn distinct_values(&self, batch: &RecordBatch, name: &str) -> Vec<RealizedValue> {
        let Some(array) = batch.column_by_name(name) else {
            return Vec::new();
        };

        let mut distinct = IndexSet::new();
        if is_text(array.data_type()) {
            if let Ok(text) = cast_with_options(array.as_ref(), &DataType::Utf8, &strict()) {
                for value in text.as_string::<i32>().iter() {
                    distinct.insert(match value {
                        Some(s) => RealizedValue::Text(s.to_string()),
                        None => RealizedValue::Null,
                    });
                }
                return distinct.into_iter().collect();
            }
        }

        for row in 0..array.len() {
            if array.is_null(row) {
                distinct.insert(RealizedValue::Null);
            } else {
                let rendered = array_value_to_string(array.as_ref(), row).unwrap_or_else(|e| e.to_string());
                distinct.insert(RealizedValue::Other(rendered));
            }
        }
        distinct.into_iter().collect()
    }

    fn has_null(&self, batch: &RecordBatch, name: &str) -> bool {
        // Dictionary keys can be valid while pointing at a null value.
        batch
            .column_by_name(name)
            .and_then(|array| array.logical_nulls())
            .is_some_and(|nulls| nulls.null_count() > 0)
    }

    fn categorical_columns(&self, batch: &RecordBatch) -> Vec<String> {
        batch
            .schema()
            .fields()
            .iter()
            .filter(|field| matches!(field.data_type(), DataType::Dictionary(_, _)))
            .map(|field| field.name().clone())
            .collect()
    }

    fn categories_are_strings(&self, batch: &RecordBatch, name: &str) -> bool {
        match batch.column_by_name(name).map(|array| array.data_type()) {
            Some(DataType::Dictionary(_, values)) => is_string_type(values),
            _ => true,
        }
    }
}
