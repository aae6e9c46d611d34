//! SQLite persistence

use super::model::TableModel;
use crate::dataset::{DATETIME_FORMAT, Dataset, Value};
use crate::error::EtlError;
use crate::etl::Loader;
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, params_from_iter};
use std::path::Path;

/// Rows committed per transaction unless configured otherwise
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Loader that inserts datasets into a SQLite table described by a
/// [`TableModel`]
///
/// The table is created on first load if it does not exist. Rows are
/// inserted in batches of `batch_size`, each batch in its own transaction,
/// so a failing batch rolls back on its own while earlier batches stay
/// committed. Only the model's columns are inserted; extra dataset columns
/// are ignored.
///
/// # Example
/// ```
/// use arcaneflow::dataset::{Dataset, LogicalType, Value};
/// use arcaneflow::etl::Loader;
/// use arcaneflow::storage::{ColumnModel, SqliteLoader, TableModel};
/// use rusqlite::Connection;
///
/// let model = TableModel::new(
///     "cities",
///     vec![ColumnModel::new("name", LogicalType::String)],
/// )?;
/// let mut loader = SqliteLoader::new(Connection::open_in_memory()?, model)?;
///
/// let data = Dataset::from_rows(["name"], vec![vec![Value::from("Oslo")]])?;
/// assert_eq!(loader.load(&data)?, 1);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct SqliteLoader {
    conn: Connection,
    model: TableModel,
    batch_size: usize,
}

impl SqliteLoader {
    /// Open (or create) the database file at `path`
    pub fn open(path: impl AsRef<Path>, model: TableModel) -> Result<Self, EtlError> {
        let path = path.as_ref();
        log::debug!("Opening SQLite database {}", path.display());
        let conn = Connection::open(path).map_err(|e| EtlError::persistence(&model.table, e))?;
        Self::new(conn, model)
    }

    pub fn new(conn: Connection, model: TableModel) -> Result<Self, EtlError> {
        model.validate()?;
        Ok(Self {
            conn,
            model,
            batch_size: DEFAULT_BATCH_SIZE,
        })
    }

    /// # Errors
    /// Returns `InvalidConfiguration` for a batch size of zero
    pub fn with_batch_size(mut self, batch_size: usize) -> Result<Self, EtlError> {
        if batch_size == 0 {
            return Err(EtlError::invalid("batch size must be at least 1"));
        }
        self.batch_size = batch_size;
        Ok(self)
    }

    pub fn model(&self) -> &TableModel {
        &self.model
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Convert every row up front so a bad cell fails before anything is
    /// written
    fn prepare_rows(&self, dataset: &Dataset) -> Result<Vec<Vec<SqlValue>>, EtlError> {
        let columns = self
            .model
            .columns
            .iter()
            .map(|model| {
                dataset
                    .column(&model.name)
                    .map(|column| (model, column))
                    .ok_or_else(|| EtlError::missing_column(&model.name))
            })
            .collect::<Result<Vec<_>, _>>()?;

        (0..dataset.row_count())
            .map(|row| {
                columns
                    .iter()
                    .map(|(model, column)| -> Result<SqlValue, EtlError> {
                        let value = &column.values()[row];
                        let coerced = value.coerce(model.logical_type).ok_or_else(|| {
                            EtlError::TypeMismatch {
                                column: model.name.clone(),
                                expected: model.logical_type,
                                found: format!("{} '{}'", value.type_name(), value),
                                row,
                            }
                        })?;
                        Ok(to_sql(coerced))
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect()
    }
}

fn to_sql(value: Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Integer(i) => SqlValue::Integer(i),
        Value::Float(f) => SqlValue::Real(f),
        Value::String(s) => SqlValue::Text(s),
        Value::Boolean(b) => SqlValue::Integer(i64::from(b)),
        Value::DateTime(dt) => SqlValue::Text(dt.format(DATETIME_FORMAT).to_string()),
    }
}

impl Loader for SqliteLoader {
    fn name(&self) -> &str {
        &self.model.table
    }

    fn load(&mut self, dataset: &Dataset) -> Result<usize, EtlError> {
        let table = self.model.table.clone();
        let rows = self.prepare_rows(dataset)?;

        self.conn
            .execute_batch(&self.model.create_table_sql())
            .map_err(|e| EtlError::persistence(&table, e))?;

        let sql = self.model.insert_sql();
        let mut inserted = 0;
        for (index, batch) in rows.chunks(self.batch_size).enumerate() {
            let tx = self
                .conn
                .transaction()
                .map_err(|e| EtlError::persistence(&table, e))?;
            {
                let mut stmt = tx
                    .prepare_cached(&sql)
                    .map_err(|e| EtlError::persistence(&table, e))?;
                for row in batch {
                    stmt.execute(params_from_iter(row.iter()))
                        .map_err(|e| EtlError::persistence(&table, e))?;
                }
            }
            tx.commit().map_err(|e| EtlError::persistence(&table, e))?;

            inserted += batch.len();
            log::debug!(
                "Committed batch {} ({} rows) into '{}'",
                index + 1,
                batch.len(),
                table
            );
        }

        log::info!("Inserted {} rows into '{}'", inserted, table);
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::LogicalType;
    use crate::storage::ColumnModel;

    fn model() -> TableModel {
        TableModel::new(
            "cities",
            vec![
                ColumnModel::new("id", LogicalType::Integer).primary_key(),
                ColumnModel::new("name", LogicalType::String),
                ColumnModel::new("capital", LogicalType::Boolean),
            ],
        )
        .unwrap()
    }

    fn loader() -> SqliteLoader {
        SqliteLoader::new(Connection::open_in_memory().unwrap(), model()).unwrap()
    }

    fn count(loader: &SqliteLoader) -> i64 {
        loader
            .connection()
            .query_row("SELECT COUNT(*) FROM \"cities\"", [], |row| row.get(0))
            .unwrap()
    }

    fn rows(ids: std::ops::Range<i64>) -> Dataset {
        Dataset::from_rows(
            ["id", "name", "capital", "ignored"],
            ids.map(|i| {
                vec![
                    Value::Integer(i),
                    Value::from(format!("city {}", i)),
                    Value::Integer(i % 2),
                    Value::Null,
                ]
            })
            .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_creates_table_and_inserts() {
        let mut loader = loader();
        assert_eq!(loader.load(&rows(0..3)).unwrap(), 3);
        assert_eq!(count(&loader), 3);

        let capital: i64 = loader
            .connection()
            .query_row("SELECT capital FROM \"cities\" WHERE id = 1", [], |row| row.get(0))
            .unwrap();
        assert_eq!(capital, 1);
    }

    #[test]
    fn test_earlier_batches_stay_committed() {
        let mut loader = loader().with_batch_size(2).unwrap();
        loader.load(&rows(2..3)).unwrap();

        // Batch [0, 1] commits, batch [2, 3] hits the duplicate key
        let err = loader.load(&rows(0..4)).unwrap_err();
        assert!(matches!(err, EtlError::Persistence { ref target, .. } if target == "cities"));
        assert_eq!(count(&loader), 3);
    }

    #[test]
    fn test_bad_cell_writes_nothing() {
        let mut loader = loader();
        let data = Dataset::from_rows(
            ["id", "name", "capital"],
            vec![
                vec![Value::Integer(1), Value::from("Oslo"), Value::Null],
                vec![Value::from("two"), Value::from("Lima"), Value::Null],
            ],
        )
        .unwrap();

        let err = loader.load(&data).unwrap_err();
        assert!(matches!(err, EtlError::TypeMismatch { row: 1, .. }));
        let exists: i64 = loader
            .connection()
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE name = 'cities'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(exists, 0);
    }

    #[test]
    fn test_missing_model_column() {
        let mut loader = loader();
        let data = Dataset::from_rows(["id"], vec![vec![Value::Integer(1)]]).unwrap();
        assert!(matches!(
            loader.load(&data),
            Err(EtlError::MissingColumn { ref column }) if column == "name"
        ));
    }

    #[test]
    fn test_zero_batch_size() {
        assert!(loader().with_batch_size(0).is_err());
    }
}
