//! The typed [`Value`] wrapper held in a resource's property map.
//!
//! A `Value` carries no datatype of its own. Correctness against a Property's
//! [`Datatype`] is established by [`validate`](crate::validate) before a value
//! is committed; values parsed from the server skip that check.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::datatype::Datatype;

/// Errors returned when constructing or coercing a [`Value`].
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValueError {
    #[error("a value cannot be null")]
    Null,

    #[error("array element at index {0} is not a string")]
    NonStringArrayElement(usize),

    #[error("number {0} cannot be represented as a JSON number")]
    NonFiniteNumber(f64),

    #[error("expected a {expected}, but the value is a {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("{0:?} is not a unix timestamp or an ISO 8601 date")]
    InvalidDate(String),
}

/// A single property value.
///
/// Immutable once constructed. Build one from JSON with
/// [`Value::try_from`], or from native Rust values via the `From` impls.
///
/// Serializes untagged: strings, numbers, and arrays as themselves, dates as
/// RFC 3339 strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    /// Kept as a JSON number so integers survive untouched.
    Number(serde_json::Number),
    Boolean(bool),
    Date(DateTime<Utc>),
    /// A list of subject URLs.
    ResourceArray(Vec<String>),
    /// An array holding anything other than strings, such as numbers or
    /// anonymous resources. Kept as the server sent it.
    Array(Vec<serde_json::Value>),
    /// An anonymous resource embedded in its parent.
    NestedResource(serde_json::Map<String, serde_json::Value>),
}

impl Value {
    /// Short name of the variant, used in mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Number(_) => "number",
            Value::Boolean(_) => "boolean",
            Value::Date(_) => "date",
            Value::ResourceArray(_) | Value::Array(_) => "array",
            Value::NestedResource(_) => "nested resource",
        }
    }

    /// Borrow the string, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn to_number(&self) -> Result<f64, ValueError> {
        match self {
            // serde_json numbers without arbitrary_precision always fit an f64.
            Value::Number(n) => n.as_f64().ok_or(ValueError::TypeMismatch {
                expected: "number",
                found: "number",
            }),
            other => Err(other.mismatch("number")),
        }
    }

    pub fn to_boolean(&self) -> Result<bool, ValueError> {
        match self {
            Value::Boolean(b) => Ok(*b),
            other => Err(other.mismatch("boolean")),
        }
    }

    pub fn to_array(&self) -> Result<&[String], ValueError> {
        match self {
            Value::ResourceArray(items) => Ok(items),
            Value::Array(items) => Err(ValueError::NonStringArrayElement(
                items.iter().position(|item| !item.is_string()).unwrap_or(0),
            )),
            other => Err(other.mismatch("array")),
        }
    }

    /// Interpret the value as a point in time.
    ///
    /// Numbers are unix milliseconds. Strings may be RFC 3339, a naive
    /// `YYYY-MM-DDTHH:MM:SS[.fff]` (read as UTC), or a bare `YYYY-MM-DD`
    /// (midnight UTC).
    pub fn to_date(&self) -> Result<DateTime<Utc>, ValueError> {
        match self {
            Value::Date(d) => Ok(*d),
            Value::Number(n) => {
                let millis = n
                    .as_i64()
                    .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
                    .ok_or_else(|| ValueError::InvalidDate(n.to_string()))?;
                DateTime::from_timestamp_millis(millis)
                    .ok_or_else(|| ValueError::InvalidDate(n.to_string()))
            }
            Value::String(s) => parse_date_string(s),
            other => Err(other.mismatch("date")),
        }
    }

    /// Convert to the wire-canonical form for `datatype`, as placed in a
    /// commit's `set` map.
    pub fn to_native(&self, datatype: &Datatype) -> Result<serde_json::Value, ValueError> {
        match datatype {
            Datatype::String
            | Datatype::Markdown
            | Datatype::Slug
            | Datatype::AtomicUrl
            | Datatype::Date => Ok(serde_json::Value::String(self.to_string())),
            Datatype::Boolean => self.to_boolean().map(serde_json::Value::Bool),
            Datatype::Timestamp => Ok(match self {
                Value::Date(d) => serde_json::Value::from(d.timestamp_millis()),
                other => other.to_json(),
            }),
            Datatype::ResourceArray => Ok(serde_json::Value::from(self.to_array()?.to_vec())),
            Datatype::Integer | Datatype::Float | Datatype::Unknown(_) => {
                Ok(serde_json::Value::String(self.to_string()))
            }
        }
    }

    /// The raw JSON form of the value, without any datatype coercion.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Number(n) => serde_json::Value::Number(n.clone()),
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Date(d) => serde_json::Value::String(format_date(d)),
            Value::ResourceArray(items) => serde_json::Value::from(items.clone()),
            Value::Array(items) => serde_json::Value::Array(items.clone()),
            Value::NestedResource(map) => serde_json::Value::Object(map.clone()),
        }
    }

    fn mismatch(&self, expected: &'static str) -> ValueError {
        ValueError::TypeMismatch {
            expected,
            found: self.kind(),
        }
    }
}

/// Arrays are joined with `,`; nested resources print as compact JSON.
/// Whole floats print without a fraction (`4.0` as `4`), so integer-valued
/// numbers read back as integers on the server.
impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Number(n) => f.write_str(&format_number(n)),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Date(d) => f.write_str(&format_date(d)),
            Value::ResourceArray(items) => f.write_str(&items.join(",")),
            Value::Array(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .map(|item| match item {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect();
                f.write_str(&parts.join(","))
            }
            Value::NestedResource(map) => {
                let json = serde_json::Value::Object(map.clone());
                write!(f, "{json}")
            }
        }
    }
}

impl TryFrom<serde_json::Value> for Value {
    type Error = ValueError;

    fn try_from(json: serde_json::Value) -> Result<Self, Self::Error> {
        match json {
            serde_json::Value::Null => Err(ValueError::Null),
            serde_json::Value::String(s) => Ok(Value::String(s)),
            serde_json::Value::Number(n) => Ok(Value::Number(n)),
            serde_json::Value::Bool(b) => Ok(Value::Boolean(b)),
            serde_json::Value::Array(items) if items.iter().all(serde_json::Value::is_string) => {
                Ok(Value::ResourceArray(
                    items
                        .into_iter()
                        .filter_map(|item| match item {
                            serde_json::Value::String(s) => Some(s),
                            _ => None,
                        })
                        .collect(),
                ))
            }
            serde_json::Value::Array(items) => Ok(Value::Array(items)),
            serde_json::Value::Object(map) => Ok(Value::NestedResource(map)),
        }
    }
}

impl TryFrom<f64> for Value {
    type Error = ValueError;

    fn try_from(f: f64) -> Result<Self, Self::Error> {
        serde_json::Number::from_f64(f)
            .map(Value::Number)
            .ok_or(ValueError::NonFiniteNumber(f))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Value::Date(d)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::ResourceArray(items)
    }
}

// --- helpers -----------------------------------------------------------------

/// Largest magnitude at which every integer is exactly representable in an f64.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

fn format_number(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if !n.is_i64() && !n.is_u64() && f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER => {
            (f as i64).to_string()
        }
        _ => n.to_string(),
    }
}

fn format_date(d: &DateTime<Utc>) -> String {
    d.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_date_string(s: &str) -> Result<DateTime<Utc>, ValueError> {
    if let Ok(d) = DateTime::parse_from_rfc3339(s) {
        return Ok(d.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ValueError::InvalidDate(s.to_string()))
}

// --- tests -------------------------------------------------------------------
