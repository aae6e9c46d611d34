//! Settings and pipeline definition files
//!
//! Two YAML documents drive the binary:
//!
//! `arcaneflow.yaml`, optional, holds defaults shared by every run:
//! ```yaml
//! database:
//!   default_connection: warehouse.db
//!   batch_size: 500
//! ```
//!
//! A pipeline definition describes one run:
//! ```yaml
//! source:
//!   name: cities
//!   type: csv
//!   location: data/cities.csv
//! transformations:
//!   - op: rename_columns
//!     mapping:
//!       pop: population
//!   - op: chain
//!     name: cleanup
//!     steps:
//!       - op: drop_columns
//!         columns: [scratch]
//!   - op: validated
//!     output_schema:
//!       population: integer
//!     step:
//!       op: cast_columns
//!       columns:
//!         population: integer
//! optimize: true
//! target:
//!   table: cities
//!   columns:
//!     - name: country_code
//!       type: string
//!       primary_key: true
//!     - name: population
//!       type: integer
//! ```

use crate::dataset::LogicalType;
use crate::error::EtlError;
use crate::schema::Schema;
use crate::source::DataSource;
use crate::storage::{DEFAULT_BATCH_SIZE, TableModel};
use crate::transform::{
    CastColumns, DropColumns, RegexReplace, RenameColumns, SelectColumns, Transformation,
    TransformationChain, Validated,
};
use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings file read when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "arcaneflow.yaml";
pub const DEFAULT_DATABASE: &str = "arcaneflow.db";

pub const DATABASE_ENV: &str = "ARCANEFLOW_DATABASE";
pub const BATCH_SIZE_ENV: &str = "ARCANEFLOW_BATCH_SIZE";

fn default_connection() -> String {
    DEFAULT_DATABASE.to_string()
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_connection")]
    pub default_connection: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            default_connection: default_connection(),
            batch_size: default_batch_size(),
        }
    }
}

/// Process-wide settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub database: DatabaseSettings,
}

impl Settings {
    /// Read settings from a YAML file
    ///
    /// A missing or empty file is not an error: defaults are used and a
    /// warning is logged.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::warn!("Settings file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        if content.trim().is_empty() {
            log::warn!("Settings file {} is empty, using defaults", path.display());
            return Ok(Self::default());
        }

        let settings: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))?;
        log::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Apply `ARCANEFLOW_DATABASE` and `ARCANEFLOW_BATCH_SIZE` overrides
    pub fn apply_env(mut self) -> Result<Self> {
        if let Ok(database) = std::env::var(DATABASE_ENV)
            && !database.trim().is_empty()
        {
            log::debug!("{} overrides database with {}", DATABASE_ENV, database);
            self.database.default_connection = database;
        }

        if let Ok(batch_size) = std::env::var(BATCH_SIZE_ENV) {
            self.database.batch_size = batch_size
                .trim()
                .parse()
                .with_context(|| format!("{} must be a whole number", BATCH_SIZE_ENV))?;
        }

        if self.database.batch_size == 0 {
            return Err(eyre!("database.batch_size must be at least 1"));
        }
        Ok(self)
    }
}

/// One transformation as written in a pipeline definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TransformDef {
    RenameColumns {
        #[serde(with = "ordered_pairs")]
        mapping: Vec<(String, String)>,
    },
    DropColumns {
        columns: Vec<String>,
    },
    SelectColumns {
        columns: Vec<String>,
    },
    CastColumns {
        #[serde(with = "ordered_pairs")]
        columns: Vec<(String, LogicalType)>,
    },
    RegexReplace {
        column: String,
        pattern: String,
        #[serde(default)]
        replacement: String,
    },
    Chain {
        #[serde(default)]
        name: Option<String>,
        steps: Vec<TransformDef>,
    },
    /// Another step with schemas checked around it
    Validated {
        step: Box<TransformDef>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        input_schema: Option<Schema>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output_schema: Option<Schema>,
    },
}

impl TransformDef {
    /// Construct the transformation, validating its configuration
    pub fn build(&self) -> std::result::Result<Transformation, EtlError> {
        let transformation = match self {
            Self::RenameColumns { mapping } => RenameColumns::new(mapping.clone())?.into(),
            Self::DropColumns { columns } => DropColumns::new(columns.clone())?.into(),
            Self::SelectColumns { columns } => SelectColumns::new(columns.clone())?.into(),
            Self::CastColumns { columns } => CastColumns::new(columns.clone())?.into(),
            Self::RegexReplace {
                column,
                pattern,
                replacement,
            } => RegexReplace::new(column.clone(), pattern, replacement.clone())?.into(),
            Self::Chain { name, steps } => {
                let chain = build_steps(steps)?;
                match name {
                    Some(name) => chain.with_name(name.clone()).into(),
                    None => chain.into(),
                }
            }
            Self::Validated {
                step,
                input_schema,
                output_schema,
            } => {
                let mut validated = Validated::new(step.build()?);
                if let Some(schema) = input_schema {
                    validated = validated.with_input(schema.clone());
                }
                if let Some(schema) = output_schema {
                    validated = validated.with_output(schema.clone());
                }
                validated.into()
            }
        };
        Ok(transformation)
    }
}

fn build_steps(steps: &[TransformDef]) -> std::result::Result<TransformationChain, EtlError> {
    let steps = steps
        .iter()
        .map(TransformDef::build)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    TransformationChain::try_new(steps)
}

/// A complete pipeline: where to read, how to reshape, where to write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineDefinition {
    pub source: DataSource,
    #[serde(default)]
    pub transformations: Vec<TransformDef>,
    pub target: TableModel,
    /// Database file for this pipeline, overriding the settings default
    #[serde(default)]
    pub database: Option<PathBuf>,
    /// Remove steps that cancel out before running
    #[serde(default)]
    pub optimize: bool,
}

impl PipelineDefinition {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read pipeline definition: {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Invalid pipeline definition: {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let definition: Self =
            serde_yaml::from_str(content).with_context(|| "Failed to parse pipeline YAML")?;
        definition.target.validate()?;
        Ok(definition)
    }

    /// Build the top-level chain. Every step is validated here, before any
    /// data is read, and the chain is optimized when the definition asks
    /// for it.
    pub fn build_chain(&self) -> std::result::Result<TransformationChain, EtlError> {
        let chain = build_steps(&self.transformations)?.with_name(self.source.name.clone());
        match self.optimize {
            true => Ok(chain.optimize()),
            false => Ok(chain),
        }
    }

    /// Database path: the definition's own, else the configured default
    pub fn database_path(&self, settings: &Settings) -> PathBuf {
        self.database
            .clone()
            .unwrap_or_else(|| PathBuf::from(&settings.database.default_connection))
    }
}

/// (De)serialize `Vec<(K, V)>` as a YAML/JSON map, keeping entry order
mod ordered_pairs {
    use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
    use serde::ser::{Serialize, SerializeMap, Serializer};
    use std::fmt;
    use std::marker::PhantomData;

    #[allow(clippy::ptr_arg)]
    pub fn serialize<S, K, V>(pairs: &Vec<(K, V)>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        K: Serialize,
        V: Serialize,
    {
        let mut map = serializer.serialize_map(Some(pairs.len()))?;
        for (key, value) in pairs {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D, K, V>(deserializer: D) -> Result<Vec<(K, V)>, D::Error>
    where
        D: Deserializer<'de>,
        K: Deserialize<'de>,
        V: Deserialize<'de>,
    {
        struct PairsVisitor<K, V>(PhantomData<(K, V)>);

        impl<'de, K, V> Visitor<'de> for PairsVisitor<K, V>
        where
            K: Deserialize<'de>,
            V: Deserialize<'de>,
        {
            type Value = Vec<(K, V)>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut pairs = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(entry) = access.next_entry()? {
                    pairs.push(entry);
                }
                Ok(pairs)
            }
        }

        deserializer.deserialize_map(PairsVisitor(PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::etl::Transformer;
    use crate::source::SourceKind;
    use serial_test::serial;
    use tempfile::TempDir;

    const PIPELINE: &str = r#"
source:
  name: cities
  type: csv
  location: data/cities.csv
  options:
    delimiter: ";"
transformations:
  - op: rename_columns
    mapping:
      pop: population
  - op: chain
    name: cleanup
    steps:
      - op: drop_columns
        columns: [scratch]
      - op: cast_columns
        columns:
          population: integer
target:
  table: cities
  columns:
    - name: country_code
      type: string
      primary_key: true
    - name: population
      type: integer
"#;

    #[test]
    fn test_parse_pipeline() {
        let definition = PipelineDefinition::from_yaml(PIPELINE).unwrap();
        assert_eq!(definition.source.kind, SourceKind::Csv);
        assert_eq!(definition.target.table, "cities");

        let chain = definition.build_chain().unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.name(), "cities");
        assert_eq!(chain.steps()[1].name(), "cleanup");
    }

    #[test]
    fn test_invalid_step_fails_build() {
        let yaml = PIPELINE.replace("pop: population", "pop: id\n      other: id");
        let definition = PipelineDefinition::from_yaml(&yaml).unwrap();
        assert!(matches!(
            definition.build_chain(),
            Err(EtlError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_optimize_flag() {
        let yaml = PIPELINE.replace(
            "  - op: chain\n",
            "  - op: rename_columns\n    mapping:\n      population: pop\n  - op: chain\n",
        );
        let mut definition = PipelineDefinition::from_yaml(&yaml).unwrap();
        assert!(!definition.optimize);
        assert_eq!(definition.build_chain().unwrap().len(), 3);

        definition.optimize = true;
        let chain = definition.build_chain().unwrap();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.steps()[0].name(), "cleanup");

        let from_yaml =
            PipelineDefinition::from_yaml(&format!("{}optimize: true\n", yaml)).unwrap();
        assert!(from_yaml.optimize);
    }

    #[test]
    fn test_validated_step() {
        let yaml = r#"
source: { name: cities, type: csv, location: cities.csv }
transformations:
  - op: validated
    output_schema:
      id: integer
      population: integer
    step:
      op: rename_columns
      mapping:
        pop: population
  - op: validated
    input_schema:
      population: integer
      id: integer
    step:
      op: drop_columns
      columns: [id]
target:
  table: cities
  columns:
    - name: population
      type: integer
"#;
        let definition = PipelineDefinition::from_yaml(yaml).unwrap();
        let chain = definition.build_chain().unwrap();
        assert_eq!(chain.len(), 2);
        assert!(chain.steps()[0].output_schema().is_some());

        let mismatched = yaml.replace(
            "      id: integer\n    step:\n      op: drop",
            "      id: string\n    step:\n      op: drop",
        );
        let definition = PipelineDefinition::from_yaml(&mismatched).unwrap();
        assert!(matches!(
            definition.build_chain(),
            Err(EtlError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_unknown_op_rejected() {
        let yaml = PIPELINE.replace("op: rename_columns", "op: pivot");
        assert!(PipelineDefinition::from_yaml(&yaml).is_err());
    }

    #[test]
    fn test_database_path() {
        let mut definition = PipelineDefinition::from_yaml(PIPELINE).unwrap();
        let settings = Settings::default();
        assert_eq!(definition.database_path(&settings), PathBuf::from("arcaneflow.db"));

        definition.database = Some(PathBuf::from("other.db"));
        assert_eq!(definition.database_path(&settings), PathBuf::from("other.db"));
    }

    #[test]
    fn test_missing_settings_file() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load(dir.path().join("arcaneflow.yaml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_partial_settings_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("arcaneflow.yaml");
        std::fs::write(&path, "database:\n  batch_size: 50\n").unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.database.batch_size, 50);
        assert_eq!(settings.database.default_connection, "arcaneflow.db");
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        unsafe {
            std::env::set_var(DATABASE_ENV, "/tmp/override.db");
            std::env::set_var(BATCH_SIZE_ENV, "25");
        }

        let settings = Settings::default().apply_env().unwrap();
        assert_eq!(settings.database.default_connection, "/tmp/override.db");
        assert_eq!(settings.database.batch_size, 25);

        unsafe {
            std::env::remove_var(DATABASE_ENV);
            std::env::remove_var(BATCH_SIZE_ENV);
        }
    }

    #[test]
    #[serial]
    fn test_bad_batch_size_env() {
        unsafe {
            std::env::set_var(BATCH_SIZE_ENV, "0");
        }
        assert!(Settings::default().apply_env().is_err());

        unsafe {
            std::env::set_var(BATCH_SIZE_ENV, "many");
        }
        assert!(Settings::default().apply_env().is_err());

        unsafe {
            std::env::remove_var(BATCH_SIZE_ENV);
        }
    }
}
