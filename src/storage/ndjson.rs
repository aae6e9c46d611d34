//! NDJSON (Newline Delimited JSON) file output

use crate::dataset::Dataset;
use crate::error::{BoxError, EtlError};
use crate::etl::Loader;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Loader that writes one JSON object per row
pub struct NdjsonWriter {
    path: PathBuf,
    append: bool,
    label: String,
}

impl NdjsonWriter {
    /// Overwrites `path` on load
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        Self {
            label: path.display().to_string(),
            path,
            append: false,
        }
    }

    /// Appends to `path` on load, creating it if needed
    pub fn appending(path: impl AsRef<Path>) -> Self {
        Self {
            append: true,
            ..Self::new(path)
        }
    }

    fn write(&self, dataset: &Dataset) -> Result<(), BoxError> {
        let mut content = String::new();
        for record in dataset.to_records() {
            content.push_str(&serde_json::to_string(&record)?);
            content.push('\n');
        }

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .append(self.append)
            .truncate(!self.append)
            .open(&self.path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

impl Loader for NdjsonWriter {
    fn name(&self) -> &str {
        &self.label
    }

    fn load(&mut self, dataset: &Dataset) -> Result<usize, EtlError> {
        self.write(dataset)
            .map_err(|e| EtlError::persistence(&self.label, e))?;
        log::info!("Wrote {} records to {}", dataset.row_count(), self.label);
        Ok(dataset.row_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Value;
    use tempfile::TempDir;

    fn data() -> Dataset {
        Dataset::from_rows(
            ["id", "name"],
            vec![
                vec![Value::Integer(1), Value::from("Oslo")],
                vec![Value::Integer(2), Value::Null],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.ndjson");

        let mut writer = NdjsonWriter::new(&path);
        assert_eq!(writer.load(&data()).unwrap(), 2);
        assert_eq!(writer.load(&data()).unwrap(), 2);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "{\"id\":1,\"name\":\"Oslo\"}\n{\"id\":2,\"name\":null}\n"
        );
    }

    #[test]
    fn test_append() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.ndjson");

        let mut writer = NdjsonWriter::appending(&path);
        writer.load(&data()).unwrap();
        writer.load(&data()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 4);
    }

    #[test]
    fn test_unwritable_path() {
        let mut writer = NdjsonWriter::new("/nonexistent/dir/out.ndjson");
        assert!(matches!(
            writer.load(&data()),
            Err(EtlError::Persistence { .. })
        ));
    }
}
