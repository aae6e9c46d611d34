//! Column selection transformer

use super::distinct_names;
use crate::dataset::Dataset;
use crate::error::EtlError;
use crate::etl::Transformer;

/// Transformer that keeps only the listed columns, in the listed order
#[derive(Debug, Clone, PartialEq)]
pub struct SelectColumns {
    columns: Vec<String>,
}

impl SelectColumns {
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

impl Transformer for SelectColumns {
    fn name(&self) -> &str {
        "select_columns"
    }

    fn transform(&self, input: &Dataset) -> Result<Dataset, EtlError> {
        let selected = self
            .columns
            .iter()
            .map(|name| {
                input
                    .column(name)
                    .cloned()
                    .ok_or_else(|| EtlError::missing_column(name))
            })
            .collect::<Result<Vec<_>, _>>()?;

        input.with_columns(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Value;

    fn input() -> Dataset {
        Dataset::from_rows(
            ["a", "b", "c"],
            vec![vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]],
        )
        .unwrap()
    }

    #[test]
    fn test_select_reorders() {
        let select = SelectColumns::new(["c", "a"]).unwrap();
        let output = select.transform(&input()).unwrap();

        assert_eq!(output.column_names(), vec!["c", "a"]);
        assert_eq!(
            output.row(0),
            Some(vec![&Value::Integer(3), &Value::Integer(1)])
        );
    }

    #[test]
    fn test_select_keeps_row_count() {
        let input = Dataset::from_rows(
            ["a"],
            vec![vec![Value::Null], vec![Value::Null], vec![Value::Null]],
        )
        .unwrap();
        let output = SelectColumns::new(["a"]).unwrap().transform(&input).unwrap();
        assert_eq!(output.row_count(), 3);
    }

    #[test]
    fn test_select_missing_column() {
        let select = SelectColumns::new(["a", "z"]).unwrap();
        let err = select.transform(&input()).unwrap_err();
        assert!(matches!(err, EtlError::MissingColumn { ref column } if column == "z"));
    }
}
