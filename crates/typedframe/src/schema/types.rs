//! Expected column types declared by a table schema.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The type a schema expects for a column or index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedType {
    Int8,
    Int16,
    Int32,
    Int64,
    #[serde(rename = "uint8")]
    UInt8,
    #[serde(rename = "uint16")]
    UInt16,
    #[serde(rename = "uint32")]
    UInt32,
    #[serde(rename = "uint64")]
    UInt64,
    Float32,
    Float64,
    Boolean,
    /// Free-form text.
    Utf8,
    /// List-like values.
    List,
    /// Mapping-like values.
    Map,
    /// Any value; the generic object column.
    Object,
    /// Calendar date without time.
    Date,
    /// Timezone-naive date and time.
    #[serde(rename = "datetime")]
    DateTime,
    /// Date and time in UTC.
    #[serde(rename = "datetime_utc")]
    DateTimeUtc,
    /// An ordered, finite set of permitted labels.
    Categorical(Vec<String>),
}

impl ExpectedType {
    /// Build a categorical type from its labels, in order.
    pub fn categorical<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ExpectedType::Categorical(labels.into_iter().map(Into::into).collect())
    }

    /// Returns true for integer and floating-point types.
    pub fn is_numeric(&self) -> bool {
        self.is_integer() || matches!(self, ExpectedType::Float32 | ExpectedType::Float64)
    }

    /// Returns true for signed and unsigned integer types.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            ExpectedType::Int8
                | ExpectedType::Int16
                | ExpectedType::Int32
                | ExpectedType::Int64
                | ExpectedType::UInt8
                | ExpectedType::UInt16
                | ExpectedType::UInt32
                | ExpectedType::UInt64
        )
    }

    /// Returns true for date and date-time types.
    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            ExpectedType::Date | ExpectedType::DateTime | ExpectedType::DateTimeUtc
        )
    }

    /// Returns true for the types stored as generic objects by untyped containers.
    pub fn is_object_like(&self) -> bool {
        matches!(
            self,
            ExpectedType::Utf8 | ExpectedType::List | ExpectedType::Map | ExpectedType::Object
        )
    }

    /// The permitted labels, if this is a categorical type.
    pub fn categories(&self) -> Option<&[String]> {
        match self {
            ExpectedType::Categorical(labels) => Some(labels),
            _ => None,
        }
    }
}

impl fmt::Display for ExpectedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExpectedType::Int8 => "int8",
            ExpectedType::Int16 => "int16",
            ExpectedType::Int32 => "int32",
            ExpectedType::Int64 => "int64",
            ExpectedType::UInt8 => "uint8",
            ExpectedType::UInt16 => "uint16",
            ExpectedType::UInt32 => "uint32",
            ExpectedType::UInt64 => "uint64",
            ExpectedType::Float32 => "float32",
            ExpectedType::Float64 => "float64",
            ExpectedType::Boolean => "bool",
            ExpectedType::Utf8 => "utf8",
            ExpectedType::List => "list",
            ExpectedType::Map => "map",
            ExpectedType::Object => "object",
            ExpectedType::Date => "date",
            ExpectedType::DateTime => "datetime",
            ExpectedType::DateTimeUtc => "datetime[UTC]",
            ExpectedType::Categorical(labels) => {
                return write!(f, "categorical[{}]", labels.join(", "));
            }
        };
        f.write_str(name)
    }
}

/// Declared type of a frame's row index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    /// Required index name.
    pub name: String,
    /// Required index type.
    pub dtype: ExpectedType,
}

impl IndexSpec {
    pub fn new(name: impl Into<String>, dtype: ExpectedType) -> Self {
        Self {
            name: name.into(),
            dtype,
        }
    }
}
