//! Cast primitives between column types.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use indexmap::IndexSet;
use serde_json::Value;

use crate::error::CoercionReason;
use crate::schema::ExpectedType;

use super::column::{Categorical, Cell, Column};

type CastResult<T> = std::result::Result<T, CoercionReason>;

/// Naive date-time layouts accepted when parsing text.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Offset-qualified layouts tried after RFC 3339.
const AWARE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%#z"];

/// Per-cell conversion failure, attributed to a value or to the source type.
enum Failure {
    Unrepresentable,
    Unsupported,
}

/// Cast `column` to `target`. Nulls stay null.
pub fn cast(column: &Column, target: &ExpectedType) -> CastResult<Column> {
    let column = match target {
        ExpectedType::Int8 => Column::Int8(convert(column, target, to_int)?),
        ExpectedType::Int16 => Column::Int16(convert(column, target, to_int)?),
        ExpectedType::Int32 => Column::Int32(convert(column, target, to_int)?),
        ExpectedType::Int64 => Column::Int64(convert(column, target, to_int)?),
        ExpectedType::UInt8 => Column::UInt8(convert(column, target, to_int)?),
        ExpectedType::UInt16 => Column::UInt16(convert(column, target, to_int)?),
        ExpectedType::UInt32 => Column::UInt32(convert(column, target, to_int)?),
        ExpectedType::UInt64 => Column::UInt64(convert(column, target, to_int)?),
        ExpectedType::Float32 => Column::Float32(convert(column, target, |c| {
            to_float(c).map(|x| x as f32)
        })?),
        ExpectedType::Float64 => Column::Float64(convert(column, target, to_float)?),
        ExpectedType::Boolean => Column::Boolean(convert(column, target, to_bool)?),
        ExpectedType::Utf8 => Column::Object(column.cells().map(|c| to_text(&c)).collect()),
        ExpectedType::Object => Column::Object(column.cells().map(|c| c.to_value()).collect()),
        ExpectedType::List => Column::Object(object_values(column, target, Value::is_array)?),
        ExpectedType::Map => Column::Object(object_values(column, target, Value::is_object)?),
        ExpectedType::Date => Column::Date(convert(column, target, to_date)?),
        ExpectedType::DateTime => Column::DateTime(convert(column, target, to_naive_datetime)?),
        ExpectedType::DateTimeUtc => Column::DateTimeUtc(convert(column, target, to_utc_datetime)?),
        ExpectedType::Categorical(labels) => to_categorical(column, labels)?,
    };
    Ok(column)
}

/// Encode `column` as an ordered categorical over exactly `labels`.
///
/// Fails with every realized value (nulls included) outside `labels`.
pub fn to_categorical(column: &Column, labels: &[String]) -> CastResult<Column> {
    let mut unknown: IndexSet<String> = IndexSet::new();
    let mut codes = Vec::with_capacity(column.len());

    for cell in column.cells() {
        let code = match &cell {
            Cell::Value(Value::String(s)) => labels.iter().position(|l| l == s),
            _ => None,
        };
        match code {
            Some(code) => codes.push(Some(code as u32)),
            None => {
                unknown.insert(cell.to_string());
            }
        }
    }

    if !unknown.is_empty() {
        return Err(CoercionReason::UnknownCategories(unknown.into_iter().collect()));
    }

    let categories = labels.iter().cloned().map(Value::String).collect();
    Ok(Column::Categorical(Categorical::from_codes(categories, codes, true)))
}

fn convert<T>(
    column: &Column,
    target: &ExpectedType,
    f: impl Fn(&Cell<'_>) -> Result<T, Failure>,
) -> CastResult<Vec<Option<T>>> {
    column
        .cells()
        .map(|cell| {
            if cell.is_null() {
                return Ok(None);
            }
            f(&cell).map(Some).map_err(|failure| match failure {
                Failure::Unrepresentable => CoercionReason::Unrepresentable {
                    value: cell.to_string(),
                    target: target.to_string(),
                },
                Failure::Unsupported => CoercionReason::Unsupported {
                    from: column.dtype().to_string(),
                    target: target.to_string(),
                },
            })
        })
        .collect()
}

fn object_values(
    column: &Column,
    target: &ExpectedType,
    accepts: fn(&Value) -> bool,
) -> CastResult<Vec<Value>> {
    column
        .cells()
        .map(|cell| match cell {
            cell if cell.is_null() => Ok(Value::Null),
            Cell::Value(v) if accepts(v) => Ok(v.clone()),
            other => Err(CoercionReason::Unrepresentable {
                value: other.to_string(),
                target: target.to_string(),
            }),
        })
        .collect()
}

fn text<'a>(cell: &Cell<'a>) -> Option<&'a str> {
    if let Cell::Value(value) = cell {
        if let Value::String(s) = *value {
            return Some(s.trim());
        }
    }
    None
}

fn float_to_i128(x: f64) -> Result<i128, Failure> {
    // Beyond 2^64 no integer target can hold the value.
    if x.is_finite() && x.fract() == 0.0 && x.abs() < 1.9e19 {
        Ok(x as i128)
    } else {
        Err(Failure::Unrepresentable)
    }
}

fn to_int<T: TryFrom<i128>>(cell: &Cell<'_>) -> Result<T, Failure> {
    let wide: i128 = match cell {
        Cell::Bool(b) | Cell::Value(Value::Bool(b)) => i128::from(*b),
        Cell::Int(i) => i128::from(*i),
        Cell::UInt(u) => i128::from(*u),
        Cell::Float(x) => float_to_i128(*x)?,
        Cell::Value(Value::Number(n)) => match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => i128::from(i),
            (None, Some(u)) => i128::from(u),
            _ => float_to_i128(n.as_f64().unwrap_or(f64::NAN))?,
        },
        Cell::Value(Value::String(s)) => {
            let s = s.trim();
            match s.parse::<i128>() {
                Ok(i) => i,
                Err(_) => float_to_i128(s.parse::<f64>().map_err(|_| Failure::Unrepresentable)?)?,
            }
        }
        Cell::Date(_) | Cell::DateTime(_) | Cell::DateTimeUtc(_) => {
            return Err(Failure::Unsupported);
        }
        Cell::Null | Cell::Value(_) => return Err(Failure::Unrepresentable),
    };
    T::try_from(wide).map_err(|_| Failure::Unrepresentable)
}

fn to_float(cell: &Cell<'_>) -> Result<f64, Failure> {
    match cell {
        Cell::Bool(b) | Cell::Value(Value::Bool(b)) => Ok(if *b { 1.0 } else { 0.0 }),
        Cell::Int(i) => Ok(*i as f64),
        Cell::UInt(u) => Ok(*u as f64),
        Cell::Float(x) => Ok(*x),
        Cell::Value(Value::Number(n)) => n.as_f64().ok_or(Failure::Unrepresentable),
        Cell::Value(Value::String(s)) => s.trim().parse().map_err(|_| Failure::Unrepresentable),
        Cell::Date(_) | Cell::DateTime(_) | Cell::DateTimeUtc(_) => Err(Failure::Unsupported),
        Cell::Null | Cell::Value(_) => Err(Failure::Unrepresentable),
    }
}

fn to_bool(cell: &Cell<'_>) -> Result<bool, Failure> {
    let flag = |x: f64| {
        if x == 1.0 {
            Ok(true)
        } else if x == 0.0 {
            Ok(false)
        } else {
            Err(Failure::Unrepresentable)
        }
    };

    match cell {
        Cell::Bool(b) | Cell::Value(Value::Bool(b)) => Ok(*b),
        Cell::Int(_) | Cell::UInt(_) | Cell::Float(_) | Cell::Value(Value::Number(_)) => {
            flag(to_float(cell)?)
        }
        Cell::Value(Value::String(s)) => match s.trim().to_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "1" => Ok(true),
            "false" | "f" | "no" | "n" | "0" => Ok(false),
            _ => Err(Failure::Unrepresentable),
        },
        Cell::Date(_) | Cell::DateTime(_) | Cell::DateTimeUtc(_) => Err(Failure::Unsupported),
        Cell::Null | Cell::Value(_) => Err(Failure::Unrepresentable),
    }
}

fn to_text(cell: &Cell<'_>) -> Value {
    match cell {
        c if c.is_null() => Value::Null,
        Cell::Value(Value::String(s)) => Value::String(s.clone()),
        other => Value::String(other.to_string()),
    }
}

/// Parse a timezone-naive date-time or a bare date (midnight).
pub(crate) fn parse_naive(s: &str) -> Option<NaiveDateTime> {
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

/// Parse a date-time carrying an explicit offset, converted to UTC.
pub(crate) fn parse_aware(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .or_else(|| {
            AWARE_FORMATS
                .iter()
                .find_map(|format| DateTime::parse_from_str(s, format).ok())
        })
        .map(|dt| dt.with_timezone(&Utc))
}

fn epoch_nanos(cell: &Cell<'_>) -> Option<i64> {
    match cell {
        Cell::Int(i) => Some(*i),
        Cell::UInt(u) => i64::try_from(*u).ok(),
        Cell::Value(Value::Number(n)) => n.as_i64(),
        _ => None,
    }
}

fn to_date(cell: &Cell<'_>) -> Result<NaiveDate, Failure> {
    match cell {
        Cell::Date(d) => Ok(*d),
        Cell::DateTime(dt) => Ok(dt.date()),
        Cell::DateTimeUtc(dt) => Ok(dt.date_naive()),
        Cell::Value(Value::String(_)) => {
            let s = text(cell).unwrap_or_default();
            parse_naive(s)
                .or_else(|| parse_aware(s).map(|dt| dt.naive_utc()))
                .map(|dt| dt.date())
                .ok_or(Failure::Unrepresentable)
        }
        Cell::Int(_) | Cell::UInt(_) | Cell::Float(_) | Cell::Bool(_) => Err(Failure::Unsupported),
        Cell::Null | Cell::Value(_) => Err(Failure::Unrepresentable),
    }
}

fn to_naive_datetime(cell: &Cell<'_>) -> Result<NaiveDateTime, Failure> {
    match cell {
        Cell::DateTime(dt) => Ok(*dt),
        Cell::Date(d) => Ok(d.and_time(NaiveTime::MIN)),
        Cell::DateTimeUtc(dt) => Ok(dt.naive_utc()),
        Cell::Value(Value::String(_)) => {
            let s = text(cell).unwrap_or_default();
            parse_naive(s)
                .or_else(|| parse_aware(s).map(|dt| dt.naive_utc()))
                .ok_or(Failure::Unrepresentable)
        }
        Cell::Int(_) | Cell::UInt(_) | Cell::Value(Value::Number(_)) => epoch_nanos(cell)
            .map(|nanos| Utc.timestamp_nanos(nanos).naive_utc())
            .ok_or(Failure::Unrepresentable),
        Cell::Float(_) | Cell::Bool(_) => Err(Failure::Unsupported),
        Cell::Null | Cell::Value(_) => Err(Failure::Unrepresentable),
    }
}

fn to_utc_datetime(cell: &Cell<'_>) -> Result<DateTime<Utc>, Failure> {
    match cell {
        Cell::DateTimeUtc(dt) => Ok(*dt),
        Cell::DateTime(dt) => Ok(Utc.from_utc_datetime(dt)),
        Cell::Date(d) => Ok(Utc.from_utc_datetime(&d.and_time(NaiveTime::MIN))),
        Cell::Value(Value::String(_)) => {
            let s = text(cell).unwrap_or_default();
            parse_aware(s)
                .or_else(|| parse_naive(s).map(|dt| Utc.from_utc_datetime(&dt)))
                .ok_or(Failure::Unrepresentable)
        }
        Cell::Int(_) | Cell::UInt(_) | Cell::Value(Value::Number(_)) => epoch_nanos(cell)
            .map(|nanos| Utc.timestamp_nanos(nanos))
            .ok_or(Failure::Unrepresentable),
        Cell::Float(_) | Cell::Bool(_) => Err(Failure::Unsupported),
        Cell::Null | Cell::Value(_) => Err(Failure::Unrepresentable),
    }
}
