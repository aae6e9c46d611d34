//! Data sources the extract stage can read from
//!
//! A [`DataSource`] is a declarative description (name, kind, location and
//! free-form options). It implements [`Extractor`] by handing the location
//! to the reader for its kind; reader failures surface as
//! `EtlError::Extraction` carrying the source name.

mod api;
mod delimited;
mod excel;
mod json;

pub use api::Auth;

use crate::dataset::Dataset;
use crate::error::{BoxError, EtlError};
use crate::etl::Extractor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Formats a [`DataSource`] can be read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Csv,
    Excel,
    Json,
    Api,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv => write!(f, "csv"),
            Self::Excel => write!(f, "excel"),
            Self::Json => write!(f, "json"),
            Self::Api => write!(f, "api"),
        }
    }
}

/// Scalar option value, as written in a pipeline definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// Where and how to read the raw data of a pipeline
///
/// Recognised options per kind:
///
/// | kind    | options                                                          |
/// |---------|------------------------------------------------------------------|
/// | `csv`   | `delimiter`, `has_headers` (default true), `trim`,                |
/// |         | `infer_types` (default true), `text_columns` (comma list)         |
/// | `excel` | `sheet` (default: first sheet)                                    |
/// | `json`  | `lines` (NDJSON), `records_path` (dot path to the record array)   |
/// | `api`   | `records_path`, `timeout_secs`, `api_key`, `username`, `password` |
///
/// # Example
/// ```no_run
/// use arcaneflow::etl::Extractor;
/// use arcaneflow::source::{DataSource, SourceKind};
///
/// let source = DataSource::new("cities", SourceKind::Csv, "data/cities.csv")
///     .with_option("delimiter", ";");
/// let dataset = source.extract()?;
/// # Ok::<(), arcaneflow::error::EtlError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SourceKind,
    pub location: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, OptionValue>,
}

impl DataSource {
    pub fn new(name: impl Into<String>, kind: SourceKind, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            location: location.into(),
            options: BTreeMap::new(),
        }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn option(&self, key: &str) -> Option<&OptionValue> {
        self.options.get(key)
    }

    pub(crate) fn str_option(&self, key: &str) -> Option<&str> {
        match self.options.get(key) {
            Some(OptionValue::String(s)) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn bool_option(&self, key: &str) -> Result<Option<bool>, BoxError> {
        match self.options.get(key) {
            None => Ok(None),
            Some(OptionValue::Bool(b)) => Ok(Some(*b)),
            Some(OptionValue::String(s)) => match s.to_lowercase().as_str() {
                "true" | "yes" => Ok(Some(true)),
                "false" | "no" => Ok(Some(false)),
                _ => Err(format!("option '{}' must be a boolean, got '{}'", key, s).into()),
            },
            Some(other) => Err(format!("option '{}' must be a boolean, got '{}'", key, other).into()),
        }
    }

    pub(crate) fn u64_option(&self, key: &str) -> Result<Option<u64>, BoxError> {
        match self.options.get(key) {
            None => Ok(None),
            Some(OptionValue::Integer(i)) if *i >= 0 => Ok(Some(*i as u64)),
            Some(OptionValue::String(s)) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| format!("option '{}' must be a whole number, got '{}'", key, s).into()),
            Some(other) => {
                Err(format!("option '{}' must be a whole number, got '{}'", key, other).into())
            }
        }
    }
}

impl Extractor for DataSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn extract(&self) -> Result<Dataset, EtlError> {
        log::info!(
            "Reading {} source '{}' from {}",
            self.kind,
            self.name,
            self.location
        );

        let dataset = match self.kind {
            SourceKind::Csv => delimited::read(self),
            SourceKind::Excel => excel::read(self),
            SourceKind::Json => json::read(self),
            SourceKind::Api => api::read(self),
        }
        .map_err(|e| EtlError::extraction(&self.name, e))?;

        log::debug!(
            "Source '{}' produced {} rows x {} columns",
            self.name,
            dataset.row_count(),
            dataset.column_count()
        );
        Ok(dataset)
    }
}
