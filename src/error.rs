//! Error types shared by every pipeline stage

use crate::dataset::LogicalType;
use crate::etl::{PipelineState, Stage};
use crate::schema::Violation;
use thiserror::Error;

/// Boxed cause reported by an external collaborator (reader, database, HTTP)
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while building or running a pipeline
#[derive(Debug, Error)]
pub enum EtlError {
    /// The caller built something that can never work (bad mapping, bad model)
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("missing column '{column}'")]
    MissingColumn { column: String },

    #[error("column '{column}' row {row}: expected {expected}, found {found}")]
    TypeMismatch {
        column: String,
        expected: LogicalType,
        found: String,
        row: usize,
    },

    /// A step of a transformation chain failed
    #[error("transformation step {step} ({name}) failed: {source}")]
    Transformation {
        step: usize,
        name: String,
        source: Box<EtlError>,
    },

    #[error("schema violation: {}", join_violations(.0))]
    SchemaViolation(Vec<Violation>),

    #[error("failed to extract from source '{source_name}': {cause}")]
    Extraction {
        source_name: String,
        #[source]
        cause: BoxError,
    },

    #[error("failed to persist into '{target}': {cause}")]
    Persistence {
        target: String,
        #[source]
        cause: BoxError,
    },
}

impl EtlError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }

    pub fn missing_column(column: impl Into<String>) -> Self {
        Self::MissingColumn {
            column: column.into(),
        }
    }

    pub fn extraction(source_name: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        Self::Extraction {
            source_name: source_name.into(),
            cause: cause.into(),
        }
    }

    pub fn persistence(target: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        Self::Persistence {
            target: target.into(),
            cause: cause.into(),
        }
    }

    /// Violations carried by a `SchemaViolation`, empty for other variants
    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::SchemaViolation(violations) => violations,
            _ => &[],
        }
    }
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A pipeline run that stopped at `stage`
#[derive(Debug, Error)]
#[error("pipeline failed while {stage}: {error}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub error: EtlError,
}

impl PipelineError {
    /// Terminal state of the failed run
    pub fn state(&self) -> PipelineState {
        PipelineState::Failed(self.stage)
    }
}
