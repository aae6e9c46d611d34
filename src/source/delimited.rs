//! Delimited text reader

use super::DataSource;
use crate::dataset::{Column, Dataset};
use crate::error::BoxError;

pub(super) fn read(source: &DataSource) -> Result<Dataset, BoxError> {
    let delimiter = match source.str_option("delimiter") {
        None => b',',
        Some(d) if d.len() == 1 => d.as_bytes()[0],
        Some("\\t") => b'\t',
        Some(other) => {
            return Err(format!("delimiter must be a single byte, got '{}'", other).into());
        }
    };
    let has_headers = source.bool_option("has_headers")?.unwrap_or(true);
    let trim = source.bool_option("trim")?.unwrap_or(false);
    let infer_types = source.bool_option("infer_types")?.unwrap_or(true);
    let text_columns: Vec<&str> = source
        .str_option("text_columns")
        .map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let mut reader = ::csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(has_headers)
        .trim(if trim { ::csv::Trim::All } else { ::csv::Trim::None })
        .from_path(&source.location)?;

    let mut names: Vec<String> = if has_headers {
        reader.headers()?.iter().map(str::to_string).collect()
    } else {
        Vec::new()
    };

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); names.len()];
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        if names.is_empty() && !has_headers {
            names = (1..=record.len()).map(|i| format!("column_{}", i)).collect();
            cells = vec![Vec::new(); names.len()];
        }
        if record.len() != names.len() {
            return Err(format!(
                "record {} has {} fields, expected {}",
                index + 1,
                record.len(),
                names.len()
            )
            .into());
        }
        for (column, field) in cells.iter_mut().zip(record.iter()) {
            column.push(field.to_string());
        }
    }

    if let Some(unknown) = text_columns
        .iter()
        .find(|c| !names.iter().any(|n| n.as_str() == **c))
    {
        return Err(format!("text_columns names unknown column '{}'", unknown).into());
    }

    let columns = names
        .into_iter()
        .zip(cells)
        .map(|(name, cells)| {
            if infer_types && !text_columns.contains(&name.as_str()) {
                Column::from_text(name, cells)
            } else {
                Column::text(name, cells)
            }
        })
        .collect();

    Ok(Dataset::new(columns)?)
}
