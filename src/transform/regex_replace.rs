//! Text rewriting transformer

use super::require_columns;
use crate::dataset::{Column, Dataset, Value};
use crate::error::EtlError;
use crate::etl::Transformer;
use regex::Regex;

/// Transformer that rewrites the text cells of one column with a regex
///
/// Every match is replaced; `replacement` may reference capture groups
/// (`$1`, `${name}`). Non-text cells are left untouched.
///
/// # Example
/// ```
/// use arcaneflow::dataset::{Dataset, Value};
/// use arcaneflow::etl::Transformer;
/// use arcaneflow::transform::RegexReplace;
///
/// let trim = RegexReplace::new("name", r"^\s+|\s+$", "").unwrap();
/// let input = Dataset::from_rows(["name"], vec![vec![Value::from("  Oslo ")]]).unwrap();
///
/// let output = trim.transform(&input).unwrap();
/// assert_eq!(output.column("name").unwrap().values(), &[Value::from("Oslo")]);
/// ```
#[derive(Debug, Clone)]
pub struct RegexReplace {
    column: String,
    pattern: Regex,
    replacement: String,
}

impl RegexReplace {
    /// # Errors
    /// Returns `InvalidConfiguration` if the pattern does not compile
    pub fn new(
        column: impl Into<String>,
        pattern: &str,
        replacement: impl Into<String>,
    ) -> Result<Self, EtlError> {
        let pattern = Regex::new(pattern)
            .map_err(|e| EtlError::invalid(format!("invalid regex pattern '{}': {}", pattern, e)))?;

        Ok(Self {
            column: column.into(),
            pattern,
            replacement: replacement.into(),
        })
    }

    pub fn column(&self) -> &str {
        &self.column
    }
}

impl PartialEq for RegexReplace {
    fn eq(&self, other: &Self) -> bool {
        self.column == other.column
            && self.pattern.as_str() == other.pattern.as_str()
            && self.replacement == other.replacement
    }
}

impl Transformer for RegexReplace {
    fn name(&self) -> &str {
        "regex_replace"
    }

    fn transform(&self, input: &Dataset) -> Result<Dataset, EtlError> {
        require_columns(input, [self.column.as_str()])?;

        let columns = input
            .columns()
            .iter()
            .map(|column| {
                if column.name() != self.column {
                    return column.clone();
                }
                let values = column
                    .values()
                    .iter()
                    .map(|value| match value {
                        Value::String(s) => Value::String(
                            self.pattern
                                .replace_all(s, self.replacement.as_str())
                                .into_owned(),
                        ),
                        other => other.clone(),
                    })
                    .collect();
                Column::new(column.name(), values)
            })
            .collect();

        input.with_columns(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_with_groups() {
        let input = Dataset::from_rows(
            ["phone", "id"],
            vec![
                vec![Value::from("555-1234"), Value::Integer(1)],
                vec![Value::Null, Value::Integer(2)],
            ],
        )
        .unwrap();
        let reformat = RegexReplace::new("phone", r"(\d{3})-(\d{4})", "($1) $2").unwrap();

        let output = reformat.transform(&input).unwrap();
        assert_eq!(
            output.column("phone").unwrap().values(),
            &[Value::from("(555) 1234"), Value::Null]
        );
        assert_eq!(output.column("id"), input.column("id"));
    }

    #[test]
    fn test_invalid_pattern() {
        let result = RegexReplace::new("name", "(unclosed", "");
        assert!(matches!(result, Err(EtlError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_missing_column() {
        let input = Dataset::from_rows(["id"], vec![]).unwrap();
        let replace = RegexReplace::new("name", "a", "b").unwrap();
        assert!(matches!(
            replace.transform(&input),
            Err(EtlError::MissingColumn { .. })
        ));
    }
}
