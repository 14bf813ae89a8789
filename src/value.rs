use std::{fmt, str::FromStr, time::Duration};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};

use crate::{
    error::{Error, Result},
    field::FieldType,
};

/// A typed field value.
///
/// # Examples
///
/// ```
/// use tagql::{FieldType, Value};
///
/// let v = Value::parse(FieldType::Duration, "1h30m").unwrap();
/// assert_eq!(v.to_string(), "1h30m");
///
/// let v = Value::parse(FieldType::Float, "0.1").unwrap();
/// assert_eq!(v.to_string(), "0.1");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    /// Decimal so that user supplied literals such as `0.1` bind exactly
    Float(Decimal),
    Bool(bool),
    Time(DateTime<Utc>),
    Json(serde_json::Value),
    Array(Vec<String>),
    Duration(Duration),
}

/// A field value that distinguishes "not given" from "given as null".
///
/// Updates only touch `Set` and `Null` fields; `Unset` fields keep whatever
/// the row already holds.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldValue {
    #[default]
    Unset,
    Null,
    Set(Value),
}

/// A statement parameter in the form the store binds it.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Null,
    Text(String),
    Int(i64),
    Numeric(Decimal),
    Bool(bool),
    Timestamp(DateTime<Utc>),
    Json(serde_json::Value),
    TextArray(Vec<String>),
}

impl Value {
    /// Parses user supplied text as a value of `kind`.
    pub fn parse(kind: FieldType, text: &str) -> Result<Value> {
        let bad = || Error::InvalidRequest(format!("{:?} is not a valid {} value", text, kind));

        Ok(match kind {
            FieldType::String => Value::String(text.to_string()),
            FieldType::Int => Value::Int(text.trim().parse().map_err(|_| bad())?),
            FieldType::Float => Value::Float(parse_decimal(text).ok_or_else(bad)?),
            FieldType::Bool => Value::Bool(parse_bool(text).ok_or_else(bad)?),
            FieldType::Time => Value::Time(parse_time(text).ok_or_else(bad)?),
            FieldType::Json => Value::Json(
                serde_json::from_str(text)
                    .unwrap_or_else(|_| serde_json::Value::String(text.to_string())),
            ),
            FieldType::Array => Value::Array(vec![text.to_string()]),
            FieldType::Duration => Value::Duration(parse_duration(text).ok_or_else(bad)?),
        })
    }

    /// Storage form.
    pub fn to_param(&self) -> Param {
        match self {
            Value::String(s) => Param::Text(s.clone()),
            Value::Int(n) => Param::Int(*n),
            Value::Float(d) => Param::Numeric(*d),
            Value::Bool(b) => Param::Bool(*b),
            Value::Time(t) => Param::Timestamp(*t),
            Value::Json(j) => Param::Json(j.clone()),
            Value::Array(items) => Param::TextArray(items.clone()),
            Value::Duration(d) => Param::Int(d.as_millis().min(i64::MAX as u128) as i64),
        }
    }

    /// Wire (JSON) form.
    pub fn to_wire(&self) -> serde_json::Value {
        match self {
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Int(n) => serde_json::Value::from(*n),
            Value::Float(d) => d
                .to_f64()
                .and_then(serde_json::Number::from_f64)
                .map(serde_json::Value::Number)
                .unwrap_or_else(|| serde_json::Value::String(d.to_string())),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Time(t) => serde_json::Value::String(t.to_rfc3339()),
            Value::Json(j) => j.clone(),
            Value::Array(items) => serde_json::Value::from(items.clone()),
            Value::Duration(d) => serde_json::Value::String(format_duration(*d)),
        }
    }
}

impl FieldValue {
    /// Storage form; `None` for unset values, which are never bound.
    pub fn to_param(&self) -> Option<Param> {
        match self {
            FieldValue::Unset => None,
            FieldValue::Null => Some(Param::Null),
            FieldValue::Set(v) => Some(v.to_param()),
        }
    }

    /// Wire form. Unset and null both serialize as JSON null.
    pub fn to_wire(&self) -> serde_json::Value {
        match self {
            FieldValue::Unset | FieldValue::Null => serde_json::Value::Null,
            FieldValue::Set(v) => v.to_wire(),
        }
    }

    /// Reads the wire form of a `kind` field.
    pub fn from_wire(kind: FieldType, wire: &serde_json::Value) -> Result<FieldValue> {
        let bad = || Error::InvalidRequest(format!("{} is not a valid {} value", wire, kind));

        let value = match (kind, wire) {
            (_, serde_json::Value::Null) => return Ok(FieldValue::Null),
            (FieldType::Json, j) => Value::Json(j.clone()),
            (FieldType::Int, serde_json::Value::Number(n)) => {
                Value::Int(n.as_i64().ok_or_else(bad)?)
            }
            (FieldType::Float, serde_json::Value::Number(n)) => Value::Float(
                n.as_i64()
                    .map(Decimal::from)
                    .or_else(|| n.as_f64().and_then(Decimal::from_f64))
                    .ok_or_else(bad)?,
            ),
            (FieldType::Bool, serde_json::Value::Bool(b)) => Value::Bool(*b),
            (FieldType::Array, serde_json::Value::Array(items)) => Value::Array(
                items
                    .iter()
                    .map(|item| match item {
                        serde_json::Value::String(s) => Ok(s.clone()),
                        _ => Err(bad()),
                    })
                    .collect::<Result<_>>()?,
            ),
            (FieldType::Duration, serde_json::Value::Number(n)) => {
                Value::Duration(Duration::from_millis(n.as_u64().ok_or_else(bad)?))
            }
            (kind, serde_json::Value::String(s)) => Value::parse(kind, s)?,
            _ => return Err(bad()),
        };
        Ok(FieldValue::Set(value))
    }

    /// Reads a `kind` column as returned by the store.
    pub fn from_param(kind: FieldType, param: &Param) -> Result<FieldValue> {
        let value = match (kind, param) {
            (_, Param::Null) => return Ok(FieldValue::Null),
            (FieldType::String, Param::Text(s)) => Value::String(s.clone()),
            (FieldType::Int, Param::Int(n)) => Value::Int(*n),
            (FieldType::Float, Param::Numeric(d)) => Value::Float(*d),
            (FieldType::Float, Param::Int(n)) => Value::Float(Decimal::from(*n)),
            (FieldType::Bool, Param::Bool(b)) => Value::Bool(*b),
            (FieldType::Time, Param::Timestamp(t)) => Value::Time(*t),
            (FieldType::Json, Param::Json(j)) => Value::Json(j.clone()),
            (FieldType::Json, Param::Text(s)) => Value::Json(
                serde_json::from_str(s).map_err(|e| Error::Database(e.to_string()))?,
            ),
            (FieldType::Array, Param::TextArray(items)) => Value::Array(items.clone()),
            (FieldType::Duration, Param::Int(ms)) => {
                Value::Duration(Duration::from_millis((*ms).max(0) as u64))
            }
            (kind, Param::Text(s)) => Value::parse(kind, s).map_err(|_| mismatch(kind, param))?,
            (kind, param) => return Err(mismatch(kind, param)),
        };
        Ok(FieldValue::Set(value))
    }
}

fn mismatch(kind: FieldType, param: &Param) -> Error {
    Error::Config(format!("{} column returned {:?}", kind, param))
}

impl Param {
    /// JSON rendering used for diagnostics and the command-line tool.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Param::Null => serde_json::Value::Null,
            Param::Text(s) => serde_json::Value::String(s.clone()),
            Param::Int(n) => serde_json::Value::from(*n),
            Param::Numeric(d) => serde_json::Value::String(d.to_string()),
            Param::Bool(b) => serde_json::Value::Bool(*b),
            Param::Timestamp(t) => serde_json::Value::String(t.to_rfc3339()),
            Param::Json(j) => j.clone(),
            Param::TextArray(items) => serde_json::Value::from(items.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(d) => write!(f, "{}", d.normalize()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Time(t) => f.write_str(&t.to_rfc3339()),
            Value::Json(j) => write!(f, "{}", j),
            Value::Array(items) => f.write_str(&items.join(",")),
            Value::Duration(d) => f.write_str(&format_duration(*d)),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Unset => Ok(()),
            FieldValue::Null => f.write_str("null"),
            FieldValue::Set(v) => write!(f, "{}", v),
        }
    }
}

pub fn parse_decimal(text: &str) -> Option<Decimal> {
    let text = text.trim();
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "1" => Some(true),
        "false" | "f" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// RFC 3339 timestamps, or bare `YYYY-MM-DD` dates at midnight UTC.
pub fn parse_time(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(text) {
        return Some(t.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()?
        .and_hms_opt(0, 0, 0)
        .map(|t| t.and_utc())
}

const NANOS_PER_UNIT: [(&str, u64); 7] = [
    ("ns", 1),
    ("us", 1_000),
    ("µs", 1_000),
    ("ms", 1_000_000),
    ("s", 1_000_000_000),
    ("m", 60_000_000_000),
    ("h", 3_600_000_000_000),
];

/// Parses `1h30m`, `1.5s`, `250ms`; a bare number is seconds.
pub fn parse_duration(text: &str) -> Option<Duration> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(secs) = text.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }

    let mut nanos = Decimal::ZERO;
    let mut rest = text;
    while !rest.is_empty() {
        let num_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if num_end == 0 {
            return None;
        }
        let number = Decimal::from_str(&rest[..num_end]).ok()?;
        rest = &rest[num_end..];

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit = &rest[..unit_end];
        let (_, per_unit) = NANOS_PER_UNIT.iter().find(|(name, _)| *name == unit)?;
        nanos += number.checked_mul(Decimal::from(*per_unit))?;
        rest = &rest[unit_end..];
    }

    nanos.trunc().to_u64().map(Duration::from_nanos)
}

/// Formats a duration the way [`parse_duration`] reads it.
pub fn format_duration(d: Duration) -> String {
    if d.is_zero() {
        return "0s".to_string();
    }
    if d < Duration::from_secs(1) {
        return format!("{}ms", d.as_millis());
    }

    let total = d.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    let millis = d.subsec_millis();

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{}h", hours));
    }
    if minutes > 0 {
        out.push_str(&format!("{}m", minutes));
    }
    if seconds > 0 || millis > 0 {
        if millis > 0 {
            let frac = format!("{:03}", millis);
            out.push_str(&format!("{}.{}s", seconds, frac.trim_end_matches('0')));
        } else {
            out.push_str(&format!("{}s", seconds));
        }
    }
    out
}
