//! Column dropper transformer
//!
//! Removes columns that should not reach the destination, such as scratch
//! columns produced by earlier steps.

use super::{distinct_names, require_columns};
use crate::dataset::Dataset;
use crate::error::EtlError;
use crate::etl::Transformer;

/// Transformer that drops the listed columns
///
/// # Example
/// ```
/// use arcaneflow::dataset::{Dataset, Value};
/// use arcaneflow::etl::Transformer;
/// use arcaneflow::transform::DropColumns;
///
/// let dropper = DropColumns::new(["created_at", "version"]).unwrap();
/// let input = Dataset::from_rows(
///     ["id", "created_at", "version", "title"],
///     vec![vec![
///         Value::from("test"),
///         Value::from("2024-01-01"),
///         Value::from("1.0"),
///         Value::from("My Object"),
///     ]],
/// )
/// .unwrap();
///
/// let output = dropper.transform(&input).unwrap();
/// assert_eq!(output.column_names(), vec!["id", "title"]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DropColumns {
    columns: Vec<String>,
}

impl DropColumns {
    /// Create a new dropper for the specified columns
    ///
    /// # Errors
    /// Returns `InvalidConfiguration` for an empty or repeating list
    pub fn new<I, S>(columns: I) -> Result<Self, EtlError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self {
            columns: distinct_names(columns)?,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

impl Transformer for DropColumns {
    fn name(&self) -> &str {
        "drop_columns"
    }

    fn transform(&self, input: &Dataset) -> Result<Dataset, EtlError> {
        require_columns(input, self.columns.iter().map(String::as_str))?;

        input.with_columns(
            input
                .columns()
                .iter()
                .filter(|c| !self.columns.iter().any(|name| name == c.name()))
                .cloned()
                .collect(),
        )
    }
}
