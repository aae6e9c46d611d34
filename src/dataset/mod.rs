//! In-memory tabular data
//!
//! A [`Dataset`] is an ordered set of uniquely named [`Column`]s that all hold
//! the same number of [`Value`]s. Datasets are treated as immutable values:
//! transformations build new datasets instead of editing one in place.

mod value;

pub use value::{DATETIME_FORMAT, LogicalType, Value, parse_datetime};

use crate::error::EtlError;
use std::collections::HashSet;

/// A named column of cells
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Build a column from raw text cells, typing it as a whole.
    ///
    /// The column becomes the first of integer, float, boolean or datetime
    /// that every non-blank cell parses as, and string otherwise. Blank cells
    /// become nulls.
    ///
    /// # Example
    /// ```
    /// use arcaneflow::dataset::{Column, Value};
    ///
    /// let column = Column::from_text("pop", vec!["10".into(), "".into(), "30".into()]);
    /// assert_eq!(column.values(), &[Value::Integer(10), Value::Null, Value::Integer(30)]);
    /// ```
    pub fn from_text(name: impl Into<String>, cells: Vec<String>) -> Self {
        let inferred = [
            LogicalType::Integer,
            LogicalType::Float,
            LogicalType::Boolean,
            LogicalType::DateTime,
        ]
        .into_iter()
        .find(|ty| {
            cells
                .iter()
                .filter(|cell| !cell.trim().is_empty())
                .all(|cell| value::parse_text(cell, *ty).is_some())
        });

        let values = cells
            .into_iter()
            .map(|cell| match inferred {
                Some(ty) => value::parse_text(&cell, ty).unwrap_or(Value::String(cell)),
                None if cell.trim().is_empty() => Value::Null,
                None => Value::String(cell),
            })
            .collect();

        Self::new(name, values)
    }

    /// Build a column from raw text cells without inferring a type. Blank
    /// cells become nulls; everything else stays text, leading zeros
    /// included.
    pub fn text(name: impl Into<String>, cells: Vec<String>) -> Self {
        let values = cells
            .into_iter()
            .map(|cell| match cell.trim().is_empty() {
                true => Value::Null,
                false => Value::String(cell),
            })
            .collect();
        Self::new(name, values)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Same cells under a different name
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self::new(name, self.values.clone())
    }
}

/// Ordered, uniquely named columns of equal length
///
/// The row count is stored with the columns, so a dataset whose columns were
/// all dropped still knows how many rows it has.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<Column>,
    rows: usize,
}

impl Dataset {
    /// Create a dataset from columns. The row count is the first column's
    /// length, or zero without columns.
    ///
    /// # Errors
    /// Returns `InvalidConfiguration` if two columns share a name or the
    /// columns differ in length.
    pub fn new(columns: Vec<Column>) -> Result<Self, EtlError> {
        let rows = columns.first().map_or(0, Column::len);
        Self::with_row_count(columns, rows)
    }

    /// Replace the columns of this dataset, keeping its row count
    ///
    /// # Errors
    /// Same as [`Dataset::new`], and a column whose length differs from the
    /// current row count is rejected too.
    pub fn with_columns(&self, columns: Vec<Column>) -> Result<Self, EtlError> {
        Self::with_row_count(columns, self.rows)
    }

    fn with_row_count(columns: Vec<Column>, rows: usize) -> Result<Self, EtlError> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name()) {
                return Err(EtlError::invalid(format!(
                    "duplicate column '{}'",
                    column.name()
                )));
            }
        }

        if let Some(ragged) = columns.iter().find(|c| c.len() != rows) {
            return Err(EtlError::invalid(format!(
                "column '{}' has {} rows, expected {}",
                ragged.name(),
                ragged.len(),
                rows
            )));
        }

        Ok(Self { columns, rows })
    }

    /// Create a dataset from row-major cells
    ///
    /// # Example
    /// ```
    /// use arcaneflow::dataset::{Dataset, Value};
    ///
    /// let data = Dataset::from_rows(
    ///     ["id", "name"],
    ///     vec![
    ///         vec![Value::Integer(1), Value::from("Oslo")],
    ///         vec![Value::Integer(2), Value::from("Lima")],
    ///     ],
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(data.row_count(), 2);
    /// assert_eq!(data.column_names(), vec!["id", "name"]);
    /// ```
    pub fn from_rows<I, S>(names: I, rows: Vec<Vec<Value>>) -> Result<Self, EtlError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let row_count = rows.len();
        let mut values: Vec<Vec<Value>> = names
            .iter()
            .map(|_| Vec::with_capacity(rows.len()))
            .collect();

        for (index, row) in rows.into_iter().enumerate() {
            if row.len() != names.len() {
                return Err(EtlError::invalid(format!(
                    "row {} has {} cells, expected {}",
                    index,
                    row.len(),
                    names.len()
                )));
            }
            for (column, cell) in values.iter_mut().zip(row) {
                column.push(cell);
            }
        }

        Self::with_row_count(
            names
                .into_iter()
                .zip(values)
                .map(|(name, values)| Column::new(name, values))
                .collect(),
            row_count,
        )
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    /// Cells of one row, in column order
    pub fn row(&self, index: usize) -> Option<Vec<&Value>> {
        (index < self.row_count()).then(|| self.columns.iter().map(|c| &c.values[index]).collect())
    }

    pub fn rows(&self) -> impl Iterator<Item = Vec<&Value>> + '_ {
        (0..self.row_count()).map(|index| self.columns.iter().map(|c| &c.values[index]).collect())
    }

    /// One JSON object per row, keys in column order
    pub fn to_records(&self) -> Vec<serde_json::Value> {
        self.rows()
            .map(|row| {
                let record: serde_json::Map<String, serde_json::Value> = self
                    .columns
                    .iter()
                    .zip(row)
                    .map(|(column, value)| (column.name().to_string(), value.to_json()))
                    .collect();
                serde_json::Value::Object(record)
            })
            .collect()
    }

    /// First `n` rows
    pub fn head(&self, n: usize) -> Self {
        Self {
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(c.name(), c.values.iter().take(n).cloned().collect()))
                .collect(),
            rows: self.rows.min(n),
        }
    }
}
