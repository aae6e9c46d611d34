//! Column renaming transformer

use super::require_columns;
use crate::dataset::Dataset;
use crate::error::EtlError;
use crate::etl::Transformer;
use std::collections::HashSet;

/// Transformer that renames columns, keeping their position
///
/// All renames happen at once, so `{a: b, b: a}` swaps two columns.
///
/// # Example
/// ```
/// use arcaneflow::dataset::{Dataset, Value};
/// use arcaneflow::etl::Transformer;
/// use arcaneflow::transform::RenameColumns;
///
/// let rename = RenameColumns::new([("pop", "population")]).unwrap();
/// let input = Dataset::from_rows(["id", "pop"], vec![vec![Value::Integer(1), Value::Integer(5)]]).unwrap();
///
/// let output = rename.transform(&input).unwrap();
/// assert_eq!(output.column_names(), vec!["id", "population"]);
/// assert_eq!(input.column_names(), vec!["id", "pop"]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RenameColumns {
    mapping: Vec<(String, String)>,
}

impl RenameColumns {
    /// Create a renamer from `(old, new)` pairs
    ///
    /// # Errors
    /// Returns `InvalidConfiguration` if the mapping is empty, renames a
    /// column twice, uses an empty name, or sends two columns to the same
    /// target.
    pub fn new<I, K, V>(mapping: I) -> Result<Self, EtlError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mapping: Vec<(String, String)> = mapping
            .into_iter()
            .map(|(old, new)| (old.into(), new.into()))
            .collect();

        if mapping.is_empty() {
            return Err(EtlError::invalid("column mapping cannot be empty"));
        }

        let mut sources = HashSet::new();
        let mut targets = HashSet::new();
        for (old, new) in &mapping {
            if old.is_empty() || new.is_empty() {
                return Err(EtlError::invalid("column names cannot be empty"));
            }
            if !sources.insert(old.as_str()) {
                return Err(EtlError::invalid(format!(
                    "column '{}' is renamed more than once",
                    old
                )));
            }
            if !targets.insert(new.as_str()) {
                return Err(EtlError::invalid(format!(
                    "duplicate rename target '{}'",
                    new
                )));
            }
        }

        Ok(Self { mapping })
    }

    pub fn mapping(&self) -> &[(String, String)] {
        &self.mapping
    }

    fn target_of(&self, column: &str) -> Option<&str> {
        self.mapping
            .iter()
            .find(|(old, _)| old == column)
            .map(|(_, new)| new.as_str())
    }
}

impl Transformer for RenameColumns {
    fn name(&self) -> &str {
        "rename_columns"
    }

    fn transform(&self, input: &Dataset) -> Result<Dataset, EtlError> {
        require_columns(input, self.mapping.iter().map(|(old, _)| old.as_str()))?;

        let columns: Vec<_> = input
            .columns()
            .iter()
            .map(|column| match self.target_of(column.name()) {
                Some(new) => column.renamed(new),
                None => column.clone(),
            })
            .collect();

        for (old, new) in &self.mapping {
            let collides = input.has_column(new) && self.target_of(new).is_none();
            if collides {
                return Err(EtlError::invalid(format!(
                    "renaming '{}' to '{}' collides with an existing column",
                    old, new
                )));
            }
        }

        input.with_columns(columns)
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
    fn test_rename() {
        let rename = RenameColumns::new([("b", "beta")]).unwrap();
        let output = rename.transform(&input()).unwrap();

        assert_eq!(output.column_names(), vec!["a", "beta", "c"]);
        assert_eq!(
            output.column("beta").unwrap().values(),
            &[Value::Integer(2)]
        );
    }

    #[test]
    fn test_swap() {
        let rename = RenameColumns::new([("a", "b"), ("b", "a")]).unwrap();
        let output = rename.transform(&input()).unwrap();

        assert_eq!(output.column_names(), vec!["b", "a", "c"]);
        assert_eq!(output.column("b").unwrap().values(), &[Value::Integer(1)]);
    }

    #[test]
    fn test_duplicate_targets_rejected_at_construction() {
        let result = RenameColumns::new([("a", "x"), ("b", "x")]);
        assert!(matches!(result, Err(EtlError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_empty_mapping_rejected() {
        let result = RenameColumns::new(Vec::<(String, String)>::new());
        assert!(matches!(result, Err(EtlError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_missing_column() {
        let rename = RenameColumns::new([("z", "zeta")]).unwrap();
        let err = rename.transform(&input()).unwrap_err();
        assert!(matches!(err, EtlError::MissingColumn { ref column } if column == "z"));
    }

    #[test]
    fn test_collision_with_untouched_column() {
        let rename = RenameColumns::new([("a", "c")]).unwrap();
        let err = rename.transform(&input()).unwrap_err();
        assert!(matches!(err, EtlError::InvalidConfiguration(_)));
    }
}
