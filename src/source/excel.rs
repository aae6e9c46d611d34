//! Spreadsheet reader (xlsx, xls, xlsb, ods)

use super::DataSource;
use crate::dataset::{Column, Dataset, Value, parse_datetime};
use crate::error::BoxError;
use calamine::{Data, DataType, Reader, open_workbook_auto};

pub(super) fn read(source: &DataSource) -> Result<Dataset, BoxError> {
    let mut workbook = open_workbook_auto(&source.location)
        .map_err(|e| format!("failed to open workbook {}: {}", source.location, e))?;

    let sheet = match source.str_option("sheet") {
        Some(sheet) => sheet.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or("workbook has no sheets")?,
    };
    log::debug!("Reading sheet '{}' of {}", sheet, source.location);

    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| format!("failed to read sheet '{}': {}", sheet, e))?;

    let mut rows = range.rows();
    let names: Vec<String> = match rows.next() {
        Some(header) => header
            .iter()
            .enumerate()
            .map(|(i, cell)| match cell {
                Data::Empty => format!("column_{}", i + 1),
                other => other.to_string(),
            })
            .collect(),
        None => return Ok(Dataset::default()),
    };

    let mut values: Vec<Vec<Value>> = vec![Vec::new(); names.len()];
    for row in rows {
        for (column, cell) in values.iter_mut().zip(row.iter()) {
            column.push(cell_value(cell));
        }
    }

    let columns = names
        .into_iter()
        .zip(values)
        .map(|(name, values)| Column::new(name, values))
        .collect();
    Ok(Dataset::new(columns)?)
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::Int(i) => Value::Integer(*i),
        Data::Float(f) => Value::Float(*f),
        Data::Bool(b) => Value::Boolean(*b),
        Data::String(s) if s.trim().is_empty() => Value::Null,
        Data::String(s) => Value::String(s.clone()),
        Data::DateTime(_) => cell
            .as_datetime()
            .map_or_else(|| Value::String(cell.to_string()), Value::DateTime),
        Data::DateTimeIso(s) => parse_datetime(s).map_or_else(|| Value::String(s.clone()), Value::DateTime),
        Data::Error(e) => {
            log::warn!("Spreadsheet cell error {:?} read as null", e);
            Value::Null
        }
        other => Value::String(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::LogicalType;
    use crate::source::SourceKind;

    const WORKBOOK: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/cities.xlsx");

    fn workbook() -> DataSource {
        DataSource::new("book", SourceKind::Excel, WORKBOOK)
    }

    #[test]
    fn test_first_sheet_by_default() {
        let data = read(&workbook()).unwrap();

        assert_eq!(
            data.column_names(),
            vec!["code", "city", "pop", "capital", "founded"]
        );
        assert_eq!(data.row_count(), 2);
        assert_eq!(
            data.column("city").unwrap().values(),
            &[Value::from("Oslo"), Value::from("Lima")]
        );
        assert_eq!(
            data.column("capital").unwrap().values(),
            &[Value::Boolean(true), Value::Boolean(false)]
        );
    }

    #[test]
    fn test_typed_cells() {
        let data = read(&workbook()).unwrap();

        let pop = data.column("pop").unwrap().values();
        assert_eq!(pop[0].coerce(LogicalType::Integer), Some(Value::Integer(709_037)));
        assert_eq!(pop[1], Value::Float(10_092_000.5));

        let founded = data.column("founded").unwrap().values();
        assert_eq!(
            founded[0],
            Value::DateTime(parse_datetime("2024-03-01").unwrap())
        );
        assert_eq!(founded[1], Value::Null);
    }

    #[test]
    fn test_sheet_option() {
        let data = read(&workbook().with_option("sheet", "archive")).unwrap();

        assert_eq!(data.column_names(), vec!["code", "year", "note"]);
        assert_eq!(data.row_count(), 1);
        assert_eq!(data.column("note").unwrap().values(), &[Value::from("archived")]);
    }

    #[test]
    fn test_unknown_sheet() {
        assert!(read(&workbook().with_option("sheet", "missing")).is_err());
    }

    #[test]
    fn test_cell_values() {
        assert_eq!(cell_value(&Data::Empty), Value::Null);
        assert_eq!(cell_value(&Data::Int(4)), Value::Integer(4));
        assert_eq!(cell_value(&Data::Float(1.5)), Value::Float(1.5));
        assert_eq!(cell_value(&Data::Bool(true)), Value::Boolean(true));
        assert_eq!(cell_value(&Data::String(" ".into())), Value::Null);
        assert_eq!(cell_value(&Data::String("Oslo".into())), Value::from("Oslo"));
    }

    #[test]
    fn test_iso_datetime_cell() {
        let cell = Data::DateTimeIso("2024-03-01T12:30:00".into());
        assert!(matches!(cell_value(&cell), Value::DateTime(_)));
    }

    #[test]
    fn test_missing_workbook() {
        let source = DataSource::new("book", SourceKind::Excel, "/nonexistent/book.xlsx");
        assert!(read(&source).is_err());
    }
}
