//! JSON and NDJSON file reader

use super::DataSource;
use crate::dataset::{Column, Dataset, Value};
use crate::error::BoxError;
use std::collections::HashMap;

pub(super) fn read(source: &DataSource) -> Result<Dataset, BoxError> {
    let content = std::fs::read_to_string(&source.location)
        .map_err(|e| format!("failed to read {}: {}", source.location, e))?;

    if source.bool_option("lines")?.unwrap_or(false) {
        let records = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line))
            .collect::<Result<Vec<serde_json::Value>, _>>()?;
        return dataset_from_records(&records);
    }

    let document: serde_json::Value = serde_json::from_str(&content)?;
    let records = select_records(&document, source.str_option("records_path"))?;
    dataset_from_records(records)
}

/// Follow a dot separated path (`data.items`) down to an array of records.
/// Without a path the document itself must be the array.
pub(super) fn select_records<'a>(
    document: &'a serde_json::Value,
    path: Option<&str>,
) -> Result<&'a [serde_json::Value], BoxError> {
    let mut current = document;
    for key in path.into_iter().flat_map(|p| p.split('.')).filter(|k| !k.is_empty()) {
        current = current
            .get(key)
            .ok_or_else(|| format!("records path key '{}' not found", key))?;
    }

    current
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| "expected an array of records".into())
}

/// Build a dataset from JSON objects. Columns appear in first-seen key order;
/// keys absent from a record become nulls.
pub(super) fn dataset_from_records(records: &[serde_json::Value]) -> Result<Dataset, BoxError> {
    let mut names: Vec<String> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for (index, record) in records.iter().enumerate() {
        let object = record
            .as_object()
            .ok_or_else(|| format!("record {} is not a JSON object", index))?;
        for key in object.keys() {
            if !positions.contains_key(key) {
                positions.insert(key.clone(), names.len());
                names.push(key.clone());
            }
        }
    }

    let mut values: Vec<Vec<Value>> = vec![Vec::with_capacity(records.len()); names.len()];
    for record in records {
        for (name, column) in names.iter().zip(values.iter_mut()) {
            column.push(record.get(name).map_or(Value::Null, Value::from_json));
        }
    }

    let columns = names
        .into_iter()
        .zip(values)
        .map(|(name, values)| Column::new(name, values))
        .collect();
    Ok(Dataset::new(columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceKind;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_keys_become_null() {
        let records = vec![json!({"id": 1, "name": "Oslo"}), json!({"id": 2, "pop": 9.5})];
        let data = dataset_from_records(&records).unwrap();

        assert_eq!(data.column_names(), vec!["id", "name", "pop"]);
        assert_eq!(
            data.row(1),
            Some(vec![&Value::Integer(2), &Value::Null, &Value::Float(9.5)])
        );
    }

    #[test]
    fn test_records_path() {
        let document = json!({"data": {"items": [{"a": true}]}});
        let records = select_records(&document, Some("data.items")).unwrap();
        assert_eq!(records.len(), 1);
        assert!(select_records(&document, Some("data.missing")).is_err());
        assert!(select_records(&document, None).is_err());
    }

    #[test]
    fn test_non_object_record() {
        assert!(dataset_from_records(&[json!(1)]).is_err());
    }

    #[test]
    fn test_read_ndjson_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{{\"id\": 1}}\n\n{{\"id\": 2}}").unwrap();
        let source = DataSource::new("lines", SourceKind::Json, file.path().to_string_lossy())
            .with_option("lines", true);

        let data = read(&source).unwrap();
        assert_eq!(
            data.column("id").unwrap().values(),
            &[Value::Integer(1), Value::Integer(2)]
        );
    }
}
