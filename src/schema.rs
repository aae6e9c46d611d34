//! Schema descriptors and dataset validation
//!
//! A [`Schema`] is a lower bound on a dataset's shape: every declared column
//! must exist and hold values coercible to its declared [`LogicalType`].
//! Columns the schema does not mention are allowed.

use crate::dataset::{Dataset, LogicalType};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A single reason a dataset does not satisfy a schema
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    MissingColumn {
        column: String,
    },
    /// `row` is the first row whose value could not be coerced
    TypeMismatch {
        column: String,
        expected: LogicalType,
        found: String,
        row: usize,
    },
}

impl Violation {
    pub fn column(&self) -> &str {
        match self {
            Self::MissingColumn { column } | Self::TypeMismatch { column, .. } => column,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingColumn { column } => write!(f, "missing column '{}'", column),
            Self::TypeMismatch {
                column,
                expected,
                found,
                row,
            } => write!(
                f,
                "column '{}' expected {} but row {} holds {}",
                column, expected, row, found
            ),
        }
    }
}

/// Outcome of [`Schema::validate`]: every violation found, in schema order
pub type ValidationResult = Result<(), Vec<Violation>>;

/// Declared column names and logical types, in declaration order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    columns: Vec<(String, LogicalType)>,
}

impl Schema {
    /// Create a schema from `(column, type)` pairs. A column declared twice
    /// keeps its last type.
    ///
    /// # Example
    /// ```
    /// use arcaneflow::dataset::LogicalType;
    /// use arcaneflow::schema::Schema;
    ///
    /// let schema = Schema::new([
    ///     ("id", LogicalType::Integer),
    ///     ("name", LogicalType::String),
    /// ]);
    /// assert_eq!(schema.len(), 2);
    /// assert_eq!(schema.get("id"), Some(LogicalType::Integer));
    /// ```
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = (S, LogicalType)>,
        S: Into<String>,
    {
        let mut schema = Self::default();
        for (name, ty) in columns {
            schema.insert(name, ty);
        }
        schema
    }

    fn insert(&mut self, name: impl Into<String>, ty: LogicalType) {
        let name = name.into();
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some(existing) => existing.1 = ty,
            None => self.columns.push((name, ty)),
        }
    }

    /// Derive a schema from a dataset's runtime types.
    ///
    /// The first non-null value of each column decides its type; columns
    /// holding only nulls are declared as strings.
    pub fn infer(dataset: &Dataset) -> Self {
        Self::new(dataset.columns().iter().map(|column| {
            let ty = column
                .values()
                .iter()
                .find_map(|v| v.logical_type())
                .unwrap_or(LogicalType::String);
            (column.name().to_string(), ty)
        }))
    }

    pub fn get(&self, column: &str) -> Option<LogicalType> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, ty)| *ty)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, LogicalType)> {
        self.columns.iter().map(|(name, ty)| (name.as_str(), *ty))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Same columns with the same types, in any order
    pub fn is_equivalent(&self, other: &Schema) -> bool {
        self.len() == other.len()
            && self
                .columns
                .iter()
                .all(|(name, ty)| other.get(name) == Some(*ty))
    }

    /// Check `dataset` against the schema without modifying it.
    ///
    /// # Errors
    /// Returns every violation found: one `MissingColumn` per absent column
    /// and one `TypeMismatch` per column holding a non-coercible value.
    pub fn validate(&self, dataset: &Dataset) -> ValidationResult {
        let violations: Vec<Violation> = self
            .columns
            .iter()
            .filter_map(|(name, expected)| {
                let Some(column) = dataset.column(name) else {
                    return Some(Violation::MissingColumn {
                        column: name.clone(),
                    });
                };

                column
                    .values()
                    .iter()
                    .position(|value| value.coerce(*expected).is_none())
                    .map(|row| {
                        let value = &column.values()[row];
                        Violation::TypeMismatch {
                            column: name.clone(),
                            expected: *expected,
                            found: format!("{} '{}'", value.type_name(), value),
                            row,
                        }
                    })
            })
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (name, ty)) in self.columns.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", name, ty)?;
        }
        Ok(())
    }
}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, ty) in &self.columns {
            map.serialize_entry(name, ty)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SchemaVisitor;

        impl<'de> Visitor<'de> for SchemaVisitor {
            type Value = Schema;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of column names to logical types")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Schema, A::Error> {
                let mut schema = Schema::default();
                while let Some((name, ty)) = access.next_entry::<String, LogicalType>()? {
                    schema.insert(name, ty);
                }
                Ok(schema)
            }
        }

        deserializer.deserialize_map(SchemaVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Value;

    fn cities() -> Dataset {
        Dataset::from_rows(
            ["id", "name", "pop", "founded"],
            vec![
                vec![
                    Value::Integer(1),
                    Value::from("Oslo"),
                    Value::Integer(700_000),
                    Value::from("1048-01-01"),
                ],
                vec![
                    Value::Integer(2),
                    Value::from("Lima"),
                    Value::Null,
                    Value::from("1535-01-18"),
                ],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_valid_dataset_passes() {
        let schema = Schema::new([
            ("id", LogicalType::Integer),
            ("pop", LogicalType::Float),
            ("founded", LogicalType::DateTime),
        ]);
        assert_eq!(schema.validate(&cities()), Ok(()));
    }

    #[test]
    fn test_extra_columns_are_allowed() {
        let schema = Schema::new([("name", LogicalType::String)]);
        assert!(schema.validate(&cities()).is_ok());
    }

    #[test]
    fn test_reports_exactly_the_missing_column() {
        let schema = Schema::new([
            ("id", LogicalType::Integer),
            ("country_code", LogicalType::String),
        ]);

        let violations = schema.validate(&cities()).unwrap_err();
        assert_eq!(
            violations,
            vec![Violation::MissingColumn {
                column: "country_code".into()
            }]
        );
    }

    #[test]
    fn test_collects_all_violations() {
        let schema = Schema::new([
            ("region", LogicalType::String),
            ("name", LogicalType::Integer),
            ("area", LogicalType::Float),
        ]);

        let violations = schema.validate(&cities()).unwrap_err();
        let columns: Vec<&str> = violations.iter().map(Violation::column).collect();
        assert_eq!(columns, vec!["region", "name", "area"]);
        assert_eq!(
            violations[1],
            Violation::TypeMismatch {
                column: "name".into(),
                expected: LogicalType::Integer,
                found: "string 'Oslo'".into(),
                row: 0,
            }
        );
    }

    #[test]
    fn test_equivalence_ignores_order() {
        let a = Schema::new([("id", LogicalType::Integer), ("name", LogicalType::String)]);
        let b = Schema::new([("name", LogicalType::String), ("id", LogicalType::Integer)]);
        let c = Schema::new([("id", LogicalType::Float), ("name", LogicalType::String)]);

        assert!(a.is_equivalent(&b));
        assert!(!a.is_equivalent(&c));
        assert!(!a.is_equivalent(&Schema::new([("id", LogicalType::Integer)])));
    }

    #[test]
    fn test_infer() {
        let schema = Schema::infer(&cities());
        assert_eq!(schema.get("id"), Some(LogicalType::Integer));
        assert_eq!(schema.get("pop"), Some(LogicalType::Integer));
        assert_eq!(schema.get("founded"), Some(LogicalType::String));
        assert_eq!(schema.validate(&cities()), Ok(()));
    }

    #[test]
    fn test_yaml_keeps_declaration_order() {
        let schema: Schema =
            serde_yaml::from_str("zeta: integer\nalpha: string\nmid: datetime\n").unwrap();
        let names: Vec<&str> = schema.columns().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);

        let yaml = serde_yaml::to_string(&schema).unwrap();
        assert_eq!(yaml, "zeta: integer\nalpha: string\nmid: datetime\n");
    }
}
