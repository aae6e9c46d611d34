//! Cell values and the logical types they can be coerced to

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Text layout used when a datetime is rendered or persisted
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DATETIME_INPUT_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Logical column types a schema can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalType {
    Integer,
    Float,
    String,
    #[serde(rename = "datetime")]
    DateTime,
    Boolean,
}

impl LogicalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::DateTime => "datetime",
            Self::Boolean => "boolean",
        }
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogicalType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "integer" | "int" => Ok(Self::Integer),
            "float" | "real" => Ok(Self::Float),
            "string" | "text" => Ok(Self::String),
            "datetime" => Ok(Self::DateTime),
            "boolean" | "bool" => Ok(Self::Boolean),
            other => Err(format!("unknown logical type '{}'", other)),
        }
    }
}

/// A single dataset cell
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    DateTime(NaiveDateTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Runtime type of the value, `None` for nulls
    pub fn logical_type(&self) -> Option<LogicalType> {
        match self {
            Self::Null => None,
            Self::Integer(_) => Some(LogicalType::Integer),
            Self::Float(_) => Some(LogicalType::Float),
            Self::String(_) => Some(LogicalType::String),
            Self::Boolean(_) => Some(LogicalType::Boolean),
            Self::DateTime(_) => Some(LogicalType::DateTime),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.logical_type().map_or("null", |t| t.as_str())
    }

    /// Convert the value to `target`, or `None` if it is not coercible.
    ///
    /// Nulls coerce to every type. Text coerces to any type it parses as;
    /// nothing but text coerces to `string`.
    ///
    /// # Example
    /// ```
    /// use arcaneflow::dataset::{LogicalType, Value};
    ///
    /// assert_eq!(Value::Float(3.0).coerce(LogicalType::Integer), Some(Value::Integer(3)));
    /// assert_eq!(Value::Float(3.5).coerce(LogicalType::Integer), None);
    /// assert_eq!(
    ///     Value::String("true".into()).coerce(LogicalType::Boolean),
    ///     Some(Value::Boolean(true))
    /// );
    /// ```
    pub fn coerce(&self, target: LogicalType) -> Option<Value> {
        match (self, target) {
            (Self::Null, _) => Some(Self::Null),
            (Self::String(s), _) => parse_text(s, target),

            (Self::Integer(i), LogicalType::Integer) => Some(Self::Integer(*i)),
            (Self::Float(f), LogicalType::Integer) => {
                let in_range = *f >= i64::MIN as f64 && *f < i64::MAX as f64;
                (f.is_finite() && f.fract() == 0.0 && in_range).then(|| Self::Integer(*f as i64))
            }

            (Self::Integer(i), LogicalType::Float) => Some(Self::Float(*i as f64)),
            (Self::Float(f), LogicalType::Float) => Some(Self::Float(*f)),

            (Self::Boolean(b), LogicalType::Boolean) => Some(Self::Boolean(*b)),
            (Self::Integer(0), LogicalType::Boolean) => Some(Self::Boolean(false)),
            (Self::Integer(1), LogicalType::Boolean) => Some(Self::Boolean(true)),

            (Self::DateTime(dt), LogicalType::DateTime) => Some(Self::DateTime(*dt)),

            _ => None,
        }
    }

    /// Render the value as text, keeping nulls
    ///
    /// Unlike [`Value::coerce`], this accepts every type, so it is what an
    /// explicit cast to `string` uses.
    ///
    /// # Example
    /// ```
    /// use arcaneflow::dataset::Value;
    ///
    /// assert_eq!(Value::Integer(150).to_text(), Value::from("150"));
    /// assert_eq!(Value::Null.to_text(), Value::Null);
    /// ```
    pub fn to_text(&self) -> Value {
        match self {
            Self::Null => Self::Null,
            Self::String(s) => Self::String(s.clone()),
            other => Self::String(other.to_string()),
        }
    }

    /// Convert a JSON scalar into a cell. Nested arrays and objects are kept
    /// as their JSON text.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Boolean(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => n.as_f64().map_or(Self::Null, Self::Float),
            },
            serde_json::Value::String(s) => Self::String(s.clone()),
            nested => Self::String(nested.to_string()),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Integer(i) => serde_json::Value::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Boolean(b) => serde_json::Value::Bool(*b),
            Self::DateTime(dt) => serde_json::Value::String(dt.format(DATETIME_FORMAT).to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::String(s) => write!(f, "{}", s),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::DateTime(dt) => write!(f, "{}", dt.format(DATETIME_FORMAT)),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Self::DateTime(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Parse raw text as `target`. Blank text is null for every type except
/// `string`.
pub(crate) fn parse_text(text: &str, target: LogicalType) -> Option<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() && target != LogicalType::String {
        return Some(Value::Null);
    }

    match target {
        LogicalType::String => Some(Value::String(text.to_string())),
        LogicalType::Integer => trimmed.parse::<i64>().ok().map(Value::Integer),
        LogicalType::Float => trimmed
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Value::Float),
        LogicalType::Boolean => match trimmed.to_lowercase().as_str() {
            "true" => Some(Value::Boolean(true)),
            "false" => Some(Value::Boolean(false)),
            _ => None,
        },
        LogicalType::DateTime => parse_datetime(trimmed).map(Value::DateTime),
    }
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` (optionally with a `T` separator
/// and fractional seconds) and plain `YYYY-MM-DD` dates.
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }

    DATETIME_INPUT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
