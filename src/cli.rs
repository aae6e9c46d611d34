//! CLI helper functions

use crate::{
    config::{PipelineDefinition, Settings},
    etl::{Extractor, Loader, Pipeline, RunReport, Transformer},
    schema::Schema,
    storage::{NdjsonWriter, PrintLoader, SqliteLoader},
    transform::{Transformation, TransformationChain},
};
use eyre::{Context, Result};
use std::path::{Path, PathBuf};

/// Where `run` sends the validated dataset
#[derive(Debug, Clone, PartialEq)]
pub enum Sink {
    /// The pipeline's target table in SQLite
    Database,
    /// Preview the first N rows on stdout
    Print(usize),
    /// One JSON object per row in a file
    Ndjson(PathBuf),
}

/// Run a pipeline definition end to end
///
/// Pipeline: DataSource → TransformationChain → target schema → Sink
///
/// `optimize` turns on chain optimization even when the definition leaves
/// it off.
pub fn run_pipeline(
    definition_path: impl AsRef<Path>,
    settings: &Settings,
    sink: Sink,
    optimize: bool,
) -> Result<RunReport> {
    let definition_path = definition_path.as_ref();
    log::info!("Loading pipeline from {}", definition_path.display());
    let mut definition = PipelineDefinition::from_file(definition_path)?;
    definition.optimize |= optimize;

    let chain = definition
        .build_chain()
        .context("Invalid transformation chain")?;
    let schema = definition.target.schema();
    log::info!(
        "Pipeline '{}': {} step(s), {} declared column(s)",
        definition.source.name,
        chain.len(),
        schema.len()
    );

    let loader: Box<dyn Loader> = match sink {
        Sink::Database => {
            let path = definition.database_path(settings);
            log::info!(
                "Loading into table '{}' of {}",
                definition.target.table,
                path.display()
            );
            Box::new(
                SqliteLoader::open(&path, definition.target.clone())?
                    .with_batch_size(settings.database.batch_size)?,
            )
        }
        Sink::Print(limit) => Box::new(PrintLoader::stdout(limit)),
        Sink::Ndjson(path) => Box::new(NdjsonWriter::new(path)),
    };

    let report = Pipeline::new(definition.source, chain, schema, loader).run()?;
    Ok(report)
}

/// Extract a pipeline's source and infer the schema of what it produced
pub fn infer_schema(definition_path: impl AsRef<Path>) -> Result<Schema> {
    let definition = PipelineDefinition::from_file(definition_path)?;
    let dataset = definition
        .source
        .extract()
        .with_context(|| format!("Failed to extract source '{}'", definition.source.name))?;

    log::info!(
        "Inferred schema from {} row(s) of '{}'",
        dataset.row_count(),
        definition.source.name
    );
    Ok(Schema::infer(&dataset))
}

/// Validate a pipeline definition without reading data
///
/// Returns one line per transformation step with the columns it reads and
/// writes, nested chains indented. With `optimize` the optimized chain is
/// described.
pub fn check_pipeline(definition_path: impl AsRef<Path>, optimize: bool) -> Result<Vec<String>> {
    let mut definition = PipelineDefinition::from_file(definition_path)?;
    definition.optimize |= optimize;
    let chain = definition
        .build_chain()
        .context("Invalid transformation chain")?;

    let mut lines = Vec::new();
    describe_chain(&chain, 0, &mut lines);
    Ok(lines)
}

fn describe_chain(chain: &TransformationChain, depth: usize, lines: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    for (index, step) in chain.steps().iter().enumerate() {
        match step {
            Transformation::Chain(inner) => {
                lines.push(format!(
                    "{}{}. {} ({} steps)",
                    indent,
                    index,
                    inner.name(),
                    inner.len()
                ));
                describe_chain(inner, depth + 1, lines);
            }
            other => lines.push(format!(
                "{}{}. {} {}",
                indent,
                index,
                other.name(),
                other.signature()
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DEFINITION: &str = r#"
source:
  name: cities
  type: csv
  location: cities.csv
transformations:
  - op: rename_columns
    mapping:
      pop: population
  - op: chain
    name: cleanup
    steps:
      - op: drop_columns
        columns: [scratch]
target:
  table: cities
  columns:
    - name: name
      type: string
    - name: population
      type: integer
"#;

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("cities.csv"),
            "name,pop,scratch\nOslo,700,x\nLima,900,y\n",
        )
        .unwrap();
        let definition = DEFINITION.replace(
            "location: cities.csv",
            &format!("location: {}", dir.path().join("cities.csv").display()),
        );
        std::fs::write(dir.path().join("pipeline.yml"), definition).unwrap();
        dir
    }

    #[test]
    fn test_check_describes_nested_steps() {
        let dir = project();
        let lines = check_pipeline(dir.path().join("pipeline.yml"), false).unwrap();
        assert_eq!(
            lines,
            vec![
                "0. rename_columns [pop] -> [population]",
                "1. cleanup (1 steps)",
                "  0. drop_columns [scratch] -> []",
            ]
        );
    }

    #[test]
    fn test_check_optimized() {
        let dir = project();
        let path = dir.path().join("pipeline.yml");
        let definition = std::fs::read_to_string(&path).unwrap().replace(
            "  - op: chain\n",
            "  - op: rename_columns\n    mapping:\n      population: pop\n  - op: chain\n",
        );
        std::fs::write(&path, definition).unwrap();

        assert_eq!(check_pipeline(&path, false).unwrap().len(), 4);
        assert_eq!(
            check_pipeline(&path, true).unwrap(),
            vec!["0. cleanup (1 steps)", "  0. drop_columns [scratch] -> []"]
        );
    }

    #[test]
    fn test_infer_schema_from_source() {
        let dir = project();
        let schema = infer_schema(dir.path().join("pipeline.yml")).unwrap();
        assert_eq!(schema.get("pop"), Some(crate::dataset::LogicalType::Integer));
        assert_eq!(schema.len(), 3);
    }

    #[test]
    fn test_run_into_database() {
        let dir = project();
        let mut settings = Settings::default();
        settings.database.default_connection =
            dir.path().join("out.db").to_string_lossy().into_owned();

        let report = run_pipeline(
            dir.path().join("pipeline.yml"),
            &settings,
            Sink::Database,
            true,
        )
        .unwrap();
        assert_eq!(report.inserted_records, 2);

        let conn = rusqlite::Connection::open(dir.path().join("out.db")).unwrap();
        let total: i64 = conn
            .query_row("SELECT SUM(population) FROM cities", [], |row| row.get(0))
            .unwrap();
        assert_eq!(total, 1600);
    }

    #[test]
    fn test_run_into_ndjson() {
        let dir = project();
        let out = dir.path().join("out.ndjson");
        let report = run_pipeline(
            dir.path().join("pipeline.yml"),
            &Settings::default(),
            Sink::Ndjson(out.clone()),
            false,
        )
        .unwrap();

        assert_eq!(report.inserted_records, 2);
        let first = std::fs::read_to_string(out).unwrap();
        assert!(first.starts_with("{\"name\":\"Oslo\",\"population\":700}"));
    }
}
