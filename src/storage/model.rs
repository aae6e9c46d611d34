//! Declarative table models

use crate::dataset::LogicalType;
use crate::error::EtlError;
use crate::schema::Schema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

fn default_true() -> bool {
    true
}

/// One column of a [`TableModel`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnModel {
    pub name: String,
    #[serde(rename = "type")]
    pub logical_type: LogicalType,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default = "default_true")]
    pub nullable: bool,
    #[serde(default)]
    pub unique: bool,
}

impl ColumnModel {
    pub fn new(name: impl Into<String>, logical_type: LogicalType) -> Self {
        Self {
            name: name.into(),
            logical_type,
            primary_key: false,
            nullable: true,
            unique: false,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    fn sql_type(&self) -> &'static str {
        match self.logical_type {
            LogicalType::Integer | LogicalType::Boolean => "INTEGER",
            LogicalType::Float => "REAL",
            LogicalType::String | LogicalType::DateTime => "TEXT",
        }
    }
}

/// Target table description: name plus typed columns
///
/// # Example
/// ```
/// use arcaneflow::dataset::LogicalType;
/// use arcaneflow::storage::{ColumnModel, TableModel};
///
/// let model = TableModel::new(
///     "cities",
///     vec![
///         ColumnModel::new("id", LogicalType::Integer).primary_key(),
///         ColumnModel::new("name", LogicalType::String).not_null(),
///     ],
/// )
/// .unwrap();
///
/// assert_eq!(
///     model.create_table_sql(),
///     r#"CREATE TABLE IF NOT EXISTS "cities" ("id" INTEGER PRIMARY KEY NOT NULL, "name" TEXT NOT NULL)"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableModel {
    pub table: String,
    pub columns: Vec<ColumnModel>,
}

impl TableModel {
    /// # Errors
    /// Returns `InvalidConfiguration` for an empty table name, no columns or
    /// repeated column names
    pub fn new(table: impl Into<String>, columns: Vec<ColumnModel>) -> Result<Self, EtlError> {
        let model = Self {
            table: table.into(),
            columns,
        };
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<(), EtlError> {
        if self.table.trim().is_empty() {
            return Err(EtlError::invalid("table name cannot be empty"));
        }
        if self.columns.is_empty() {
            return Err(EtlError::invalid(format!(
                "table '{}' has no columns",
                self.table
            )));
        }

        let mut seen = HashSet::new();
        for column in &self.columns {
            if column.name.trim().is_empty() {
                return Err(EtlError::invalid(format!(
                    "table '{}' has a column without a name",
                    self.table
                )));
            }
            if !seen.insert(column.name.as_str()) {
                return Err(EtlError::invalid(format!(
                    "table '{}' declares column '{}' twice",
                    self.table, column.name
                )));
            }
        }
        Ok(())
    }

    /// Schema a dataset must satisfy to be loaded into this table
    pub fn schema(&self) -> Schema {
        Schema::new(
            self.columns
                .iter()
                .map(|c| (c.name.clone(), c.logical_type)),
        )
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn create_table_sql(&self) -> String {
        let keys: Vec<&ColumnModel> = self.columns.iter().filter(|c| c.primary_key).collect();
        let inline_key = keys.len() == 1;

        let mut definitions: Vec<String> = self
            .columns
            .iter()
            .map(|column| {
                let mut definition = format!("{} {}", quote(&column.name), column.sql_type());
                if column.primary_key && inline_key {
                    definition.push_str(" PRIMARY KEY");
                }
                if !column.nullable || column.primary_key {
                    definition.push_str(" NOT NULL");
                }
                if column.unique && !column.primary_key {
                    definition.push_str(" UNIQUE");
                }
                definition
            })
            .collect();

        if keys.len() > 1 {
            let names: Vec<String> = keys.iter().map(|c| quote(&c.name)).collect();
            definitions.push(format!("PRIMARY KEY ({})", names.join(", ")));
        }

        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote(&self.table),
            definitions.join(", ")
        )
    }

    pub fn insert_sql(&self) -> String {
        let names: Vec<String> = self.columns.iter().map(|c| quote(&c.name)).collect();
        let placeholders: Vec<String> = (1..=self.columns.len()).map(|i| format!("?{}", i)).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote(&self.table),
            names.join(", "),
            placeholders.join(", ")
        )
    }
}

/// Double-quote an SQL identifier
fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cities() -> TableModel {
        TableModel::new(
            "cities",
            vec![
                ColumnModel::new("country_code", LogicalType::String).primary_key(),
                ColumnModel::new("city", LogicalType::String).primary_key(),
                ColumnModel::new("population", LogicalType::Integer),
                ColumnModel::new("capital", LogicalType::Boolean).unique(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_composite_primary_key() {
        let sql = cities().create_table_sql();
        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS \"cities\" (\"country_code\" TEXT NOT NULL, \
             \"city\" TEXT NOT NULL, \"population\" INTEGER, \"capital\" INTEGER UNIQUE, \
             PRIMARY KEY (\"country_code\", \"city\"))"
        );
    }

    #[test]
    fn test_insert_sql() {
        assert_eq!(
            cities().insert_sql(),
            "INSERT INTO \"cities\" (\"country_code\", \"city\", \"population\", \"capital\") \
             VALUES (?1, ?2, ?3, ?4)"
        );
    }

    #[test]
    fn test_schema_follows_columns() {
        let schema = cities().schema();
        assert_eq!(schema.len(), 4);
        assert_eq!(schema.get("capital"), Some(LogicalType::Boolean));
    }

    #[test]
    fn test_quotes_identifiers() {
        assert_eq!(quote("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_invalid_models() {
        assert!(TableModel::new("", vec![ColumnModel::new("a", LogicalType::Integer)]).is_err());
        assert!(TableModel::new("t", vec![]).is_err());
        assert!(
            TableModel::new(
                "t",
                vec![
                    ColumnModel::new("a", LogicalType::Integer),
                    ColumnModel::new("a", LogicalType::Float),
                ],
            )
            .is_err()
        );
    }

    #[test]
    fn test_deserialize_defaults() {
        let yaml = "table: t\ncolumns:\n  - name: id\n    type: integer\n    primary_key: true\n";
        let model: TableModel = serde_yaml::from_str(yaml).unwrap();
        assert!(model.columns[0].primary_key);
        assert!(model.columns[0].nullable);
    }
}
