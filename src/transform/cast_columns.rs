//! Column type conversion transformer

use super::require_columns;
use crate::dataset::{Column, Dataset, LogicalType, Value};
use crate::error::EtlError;
use crate::etl::Transformer;
use std::collections::HashSet;

/// Transformer that converts columns to logical types
///
/// Cells are converted with [`Value::coerce`](crate::dataset::Value::coerce);
/// the first cell that cannot be converted fails the whole step. A cast to
/// `string` accepts every cell and renders it as text.
///
/// # Example
/// ```
/// use arcaneflow::dataset::{Dataset, LogicalType, Value};
/// use arcaneflow::etl::Transformer;
/// use arcaneflow::transform::CastColumns;
///
/// let cast = CastColumns::new([("zip", LogicalType::Integer)]).unwrap();
/// let input = Dataset::from_rows(["zip"], vec![vec![Value::from("0150")]]).unwrap();
///
/// let output = cast.transform(&input).unwrap();
/// assert_eq!(output.column("zip").unwrap().values(), &[Value::Integer(150)]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CastColumns {
    casts: Vec<(String, LogicalType)>,
}

impl CastColumns {
    /// # Errors
    /// Returns `InvalidConfiguration` for an empty mapping or a column cast twice
    pub fn new<I, S>(casts: I) -> Result<Self, EtlError>
    where
        I: IntoIterator<Item = (S, LogicalType)>,
        S: Into<String>,
    {
        let casts: Vec<(String, LogicalType)> =
            casts.into_iter().map(|(name, ty)| (name.into(), ty)).collect();
        if casts.is_empty() {
            return Err(EtlError::invalid("cast mapping cannot be empty"));
        }

        let mut seen = HashSet::new();
        if let Some((name, _)) = casts.iter().find(|(name, _)| !seen.insert(name.as_str())) {
            return Err(EtlError::invalid(format!("column '{}' is cast twice", name)));
        }

        Ok(Self { casts })
    }

    /// Names of the converted columns
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.casts.iter().map(|(name, _)| name.as_str())
    }

    fn cast(column: &Column, target: LogicalType) -> Result<Column, EtlError> {
        if target == LogicalType::String {
            let values = column.values().iter().map(Value::to_text).collect();
            return Ok(Column::new(column.name(), values));
        }

        let values = column
            .values()
            .iter()
            .enumerate()
            .map(|(row, value)| {
                value.coerce(target).ok_or_else(|| EtlError::TypeMismatch {
                    column: column.name().to_string(),
                    expected: target,
                    found: format!("{} '{}'", value.type_name(), value),
                    row,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Column::new(column.name(), values))
    }
}

impl Transformer for CastColumns {
    fn name(&self) -> &str {
        "cast_columns"
    }

    fn transform(&self, input: &Dataset) -> Result<Dataset, EtlError> {
        require_columns(input, self.casts.iter().map(|(name, _)| name.as_str()))?;

        let columns = input
            .columns()
            .iter()
            .map(|column| {
                match self.casts.iter().find(|(name, _)| name == column.name()) {
                    Some((_, target)) => Self::cast(column, *target),
                    None => Ok(column.clone()),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        input.with_columns(columns)
    }
}
