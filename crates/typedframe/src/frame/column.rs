//! Typed column storage.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

/// Data type of a stored column.
#[derive(Debug, Clone, PartialEq)]
pub enum DType {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Boolean,
    /// Generic values: text, lists, mappings or mixed content.
    Object,
    Date,
    DateTime,
    DateTimeUtc,
    Categorical { categories: Vec<Value>, ordered: bool },
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DType::Int8 => "int8",
            DType::Int16 => "int16",
            DType::Int32 => "int32",
            DType::Int64 => "int64",
            DType::UInt8 => "uint8",
            DType::UInt16 => "uint16",
            DType::UInt32 => "uint32",
            DType::UInt64 => "uint64",
            DType::Float32 => "float32",
            DType::Float64 => "float64",
            DType::Boolean => "bool",
            DType::Object => "object",
            DType::Date => "date",
            DType::DateTime => "datetime",
            DType::DateTimeUtc => "datetime[UTC]",
            DType::Categorical { categories, .. } => {
                let labels: Vec<String> = categories.iter().map(render_value).collect();
                return write!(f, "category[{}]", labels.join(", "));
            }
        };
        f.write_str(name)
    }
}

/// Categorical storage: codes into an ordered category list.
#[derive(Debug, Clone, PartialEq)]
pub struct Categorical {
    categories: Vec<Value>,
    codes: Vec<Option<u32>>,
    ordered: bool,
}

impl Categorical {
    /// Encode `values` over `categories`.
    ///
    /// A value that is not one of the categories is stored as null.
    pub fn new(values: &[Value], categories: Vec<Value>, ordered: bool) -> Self {
        let codes = values
            .iter()
            .map(|v| {
                categories
                    .iter()
                    .position(|c| c == v)
                    .map(|p| p as u32)
            })
            .collect();
        Self {
            categories,
            codes,
            ordered,
        }
    }

    /// Encode string labels over string categories.
    pub fn from_labels<S: AsRef<str>>(values: &[S], categories: &[&str]) -> Self {
        let values: Vec<Value> = values
            .iter()
            .map(|v| Value::String(v.as_ref().to_string()))
            .collect();
        let categories = categories
            .iter()
            .map(|c| Value::String((*c).to_string()))
            .collect();
        Self::new(&values, categories, true)
    }

    pub(crate) fn from_codes(categories: Vec<Value>, codes: Vec<Option<u32>>, ordered: bool) -> Self {
        Self {
            categories,
            codes,
            ordered,
        }
    }

    pub fn categories(&self) -> &[Value] {
        &self.categories
    }

    pub fn codes(&self) -> &[Option<u32>] {
        &self.codes
    }

    pub fn is_ordered(&self) -> bool {
        self.ordered
    }

    /// Category value at `row`; `None` for a null row.
    pub fn get(&self, row: usize) -> Option<&Value> {
        self.codes
            .get(row)
            .copied()
            .flatten()
            .and_then(|code| self.categories.get(code as usize))
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// A column of values, all of one data type. Every variant admits nulls.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Int8(Vec<Option<i8>>),
    Int16(Vec<Option<i16>>),
    Int32(Vec<Option<i32>>),
    Int64(Vec<Option<i64>>),
    UInt8(Vec<Option<u8>>),
    UInt16(Vec<Option<u16>>),
    UInt32(Vec<Option<u32>>),
    UInt64(Vec<Option<u64>>),
    Float32(Vec<Option<f32>>),
    Float64(Vec<Option<f64>>),
    Boolean(Vec<Option<bool>>),
    /// `Value::Null` is the null marker.
    Object(Vec<Value>),
    Date(Vec<Option<NaiveDate>>),
    DateTime(Vec<Option<NaiveDateTime>>),
    DateTimeUtc(Vec<Option<DateTime<Utc>>>),
    Categorical(Categorical),
}

/// One cell, borrowed from a column.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell<'a> {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    DateTimeUtc(DateTime<Utc>),
    Value(&'a Value),
}

impl Cell<'_> {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null | Cell::Value(Value::Null))
    }

    /// Convert to an owned JSON value; temporal cells become ISO strings.
    pub fn to_value(&self) -> Value {
        match self {
            Cell::Null => Value::Null,
            Cell::Bool(b) => Value::Bool(*b),
            Cell::Int(i) => Value::from(*i),
            Cell::UInt(u) => Value::from(*u),
            Cell::Float(x) => serde_json::Number::from_f64(*x)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Cell::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
            Cell::DateTime(dt) => Value::String(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
            Cell::DateTimeUtc(dt) => Value::String(dt.to_rfc3339()),
            Cell::Value(v) => (*v).clone(),
        }
    }
}

impl fmt::Display for Cell<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => f.write_str("null"),
            Cell::Value(v) => f.write_str(&render_value(v)),
            other => f.write_str(&render_value(&other.to_value())),
        }
    }
}

/// Render a JSON value without quoting plain strings.
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl Column {
    /// An all-null column of the given type.
    pub fn nulls(dtype: &DType, len: usize) -> Self {
        match dtype {
            DType::Int8 => Column::Int8(vec![None; len]),
            DType::Int16 => Column::Int16(vec![None; len]),
            DType::Int32 => Column::Int32(vec![None; len]),
            DType::Int64 => Column::Int64(vec![None; len]),
            DType::UInt8 => Column::UInt8(vec![None; len]),
            DType::UInt16 => Column::UInt16(vec![None; len]),
            DType::UInt32 => Column::UInt32(vec![None; len]),
            DType::UInt64 => Column::UInt64(vec![None; len]),
            DType::Float32 => Column::Float32(vec![None; len]),
            DType::Float64 => Column::Float64(vec![None; len]),
            DType::Boolean => Column::Boolean(vec![None; len]),
            DType::Object => Column::Object(vec![Value::Null; len]),
            DType::Date => Column::Date(vec![None; len]),
            DType::DateTime => Column::DateTime(vec![None; len]),
            DType::DateTimeUtc => Column::DateTimeUtc(vec![None; len]),
            DType::Categorical {
                categories,
                ordered,
            } => Column::Categorical(Categorical::from_codes(
                categories.clone(),
                vec![None; len],
                *ordered,
            )),
        }
    }

    /// A text column; `None` entries are null.
    pub fn text<S: AsRef<str>>(values: &[Option<S>]) -> Self {
        Column::Object(
            values
                .iter()
                .map(|v| match v {
                    Some(s) => Value::String(s.as_ref().to_string()),
                    None => Value::Null,
                })
                .collect(),
        )
    }

    pub fn dtype(&self) -> DType {
        match self {
            Column::Int8(_) => DType::Int8,
            Column::Int16(_) => DType::Int16,
            Column::Int32(_) => DType::Int32,
            Column::Int64(_) => DType::Int64,
            Column::UInt8(_) => DType::UInt8,
            Column::UInt16(_) => DType::UInt16,
            Column::UInt32(_) => DType::UInt32,
            Column::UInt64(_) => DType::UInt64,
            Column::Float32(_) => DType::Float32,
            Column::Float64(_) => DType::Float64,
            Column::Boolean(_) => DType::Boolean,
            Column::Object(_) => DType::Object,
            Column::Date(_) => DType::Date,
            Column::DateTime(_) => DType::DateTime,
            Column::DateTimeUtc(_) => DType::DateTimeUtc,
            Column::Categorical(c) => DType::Categorical {
                categories: c.categories.clone(),
                ordered: c.ordered,
            },
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Int8(v) => v.len(),
            Column::Int16(v) => v.len(),
            Column::Int32(v) => v.len(),
            Column::Int64(v) => v.len(),
            Column::UInt8(v) => v.len(),
            Column::UInt16(v) => v.len(),
            Column::UInt32(v) => v.len(),
            Column::UInt64(v) => v.len(),
            Column::Float32(v) => v.len(),
            Column::Float64(v) => v.len(),
            Column::Boolean(v) => v.len(),
            Column::Object(v) => v.len(),
            Column::Date(v) => v.len(),
            Column::DateTime(v) => v.len(),
            Column::DateTimeUtc(v) => v.len(),
            Column::Categorical(c) => c.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cell at `row`; out-of-bounds rows read as null.
    pub fn cell(&self, row: usize) -> Cell<'_> {
        fn opt<T, F: Fn(T) -> Cell<'static>>(v: Option<&Option<T>>, f: F) -> Cell<'static>
        where
            T: Copy,
        {
            match v.copied().flatten() {
                Some(x) => f(x),
                None => Cell::Null,
            }
        }

        match self {
            Column::Int8(v) => opt(v.get(row), |x| Cell::Int(x.into())),
            Column::Int16(v) => opt(v.get(row), |x| Cell::Int(x.into())),
            Column::Int32(v) => opt(v.get(row), |x| Cell::Int(x.into())),
            Column::Int64(v) => opt(v.get(row), Cell::Int),
            Column::UInt8(v) => opt(v.get(row), |x| Cell::UInt(x.into())),
            Column::UInt16(v) => opt(v.get(row), |x| Cell::UInt(x.into())),
            Column::UInt32(v) => opt(v.get(row), |x| Cell::UInt(x.into())),
            Column::UInt64(v) => opt(v.get(row), Cell::UInt),
            Column::Float32(v) => opt(v.get(row), |x| Cell::Float(x.into())),
            Column::Float64(v) => opt(v.get(row), Cell::Float),
            Column::Boolean(v) => opt(v.get(row), Cell::Bool),
            Column::Date(v) => opt(v.get(row), Cell::Date),
            Column::DateTime(v) => opt(v.get(row), Cell::DateTime),
            Column::DateTimeUtc(v) => opt(v.get(row), Cell::DateTimeUtc),
            Column::Object(v) => match v.get(row) {
                Some(Value::Null) | None => Cell::Null,
                Some(value) => Cell::Value(value),
            },
            Column::Categorical(c) => match c.get(row) {
                Some(value) => Cell::Value(value),
                None => Cell::Null,
            },
        }
    }

    pub fn cells(&self) -> impl Iterator<Item = Cell<'_>> {
        (0..self.len()).map(move |row| self.cell(row))
    }

    pub fn null_count(&self) -> usize {
        self.cells().filter(Cell::is_null).count()
    }

    pub fn has_null(&self) -> bool {
        self.cells().any(|c| c.is_null())
    }
}

macro_rules! impl_from_vec {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<Vec<$ty>> for Column {
                fn from(values: Vec<$ty>) -> Self {
                    Column::$variant(values.into_iter().map(Some).collect())
                }
            }

            impl From<Vec<Option<$ty>>> for Column {
                fn from(values: Vec<Option<$ty>>) -> Self {
                    Column::$variant(values)
                }
            }
        )*
    };
}

impl_from_vec! {
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
    bool => Boolean,
    NaiveDate => Date,
    NaiveDateTime => DateTime,
    DateTime<Utc> => DateTimeUtc,
}

impl From<Vec<&str>> for Column {
    fn from(values: Vec<&str>) -> Self {
        Column::Object(values.into_iter().map(|s| Value::String(s.to_string())).collect())
    }
}

impl From<Vec<String>> for Column {
    fn from(values: Vec<String>) -> Self {
        Column::Object(values.into_iter().map(Value::String).collect())
    }
}

impl From<Vec<Value>> for Column {
    fn from(values: Vec<Value>) -> Self {
        Column::Object(values)
    }
}

impl From<Categorical> for Column {
    fn from(categorical: Categorical) -> Self {
        Column::Categorical(categorical)
    }
}
