//! Terminal preview loader

use crate::dataset::Dataset;
use crate::error::EtlError;
use crate::etl::Loader;
use std::io::{self, Write};

/// Loader that writes the first `limit` rows as an aligned text table
///
/// Reports every row of the dataset as loaded, so a preview run produces
/// the same counts as a real one.
pub struct PrintLoader<W: Write> {
    out: W,
    limit: usize,
}

impl PrintLoader<io::Stdout> {
    pub fn stdout(limit: usize) -> Self {
        Self::new(io::stdout(), limit)
    }
}

impl<W: Write> PrintLoader<W> {
    pub fn new(out: W, limit: usize) -> Self {
        Self { out, limit }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn render(&mut self, dataset: &Dataset) -> io::Result<()> {
        let head = dataset.head(self.limit);
        let cells: Vec<Vec<String>> = head
            .rows()
            .map(|row| row.iter().map(|v| v.to_string()).collect())
            .collect();

        let widths: Vec<usize> = head
            .column_names()
            .iter()
            .enumerate()
            .map(|(i, name)| {
                cells
                    .iter()
                    .map(|row| row[i].chars().count())
                    .chain(std::iter::once(name.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let line = |fields: Vec<&str>| -> String {
            fields
                .iter()
                .zip(&widths)
                .map(|(field, width)| format!("{:<width$}", field, width = *width))
                .collect::<Vec<_>>()
                .join(" | ")
                .trim_end()
                .to_string()
        };

        writeln!(self.out, "{}", line(head.column_names()))?;
        writeln!(
            self.out,
            "{}",
            widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("-+-")
        )?;
        for row in &cells {
            writeln!(self.out, "{}", line(row.iter().map(String::as_str).collect()))?;
        }

        let hidden = dataset.row_count().saturating_sub(self.limit);
        if hidden > 0 {
            writeln!(self.out, "... {} more rows", hidden)?;
        }
        writeln!(
            self.out,
            "[{} rows x {} columns]",
            dataset.row_count(),
            dataset.column_count()
        )?;
        self.out.flush()
    }
}

impl<W: Write> Loader for PrintLoader<W> {
    fn name(&self) -> &str {
        "print"
    }

    fn load(&mut self, dataset: &Dataset) -> Result<usize, EtlError> {
        self.render(dataset)
            .map_err(|e| EtlError::persistence("print", e))?;
        Ok(dataset.row_count())
    }
}
