//! Pipeline orchestration for ETL operations

use super::{Extractor, Loader, Transformer};
use crate::dataset::Dataset;
use crate::error::{EtlError, PipelineError};
use crate::schema::Schema;
use std::fmt;

/// Stages a run passes through, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Extracting,
    Transforming,
    Validating,
    Loading,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Extracting => "extracting",
            Self::Transforming => "transforming",
            Self::Validating => "validating",
            Self::Loading => "loading",
        };
        f.write_str(name)
    }
}

/// Lifecycle of a pipeline run
///
/// `Created -> Extracting -> Transforming -> Validating -> Loading -> Completed`,
/// with `Failed` reachable from every stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Created,
    Running(Stage),
    Completed,
    Failed(Stage),
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed(_))
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Running(stage) => write!(f, "{}", stage),
            Self::Completed => write!(f, "completed"),
            Self::Failed(stage) => write!(f, "failed ({})", stage),
        }
    }
}

/// Statistics of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub source_records: usize,
    pub transformed_records: usize,
    pub inserted_records: usize,
    pub state: PipelineState,
}

/// One-shot ETL pipeline: extract, transform, validate, load
///
/// # Type Parameters
/// - `E`: Extractor producing the raw dataset
/// - `T`: Transformer applied to it (usually a transformation chain)
/// - `L`: Loader receiving the validated dataset
///
/// `run` consumes the pipeline, so every run starts from a fresh instance.
/// Callers follow its progress through [`Pipeline::on_transition`].
///
/// # Example
/// ```
/// use arcaneflow::dataset::{Dataset, LogicalType, Value};
/// use arcaneflow::etl::{Pipeline, PipelineState};
/// use arcaneflow::schema::Schema;
/// use arcaneflow::storage::PrintLoader;
/// use arcaneflow::transform::{RenameColumns, TransformationChain};
/// # use arcaneflow::error::EtlError;
/// # use arcaneflow::etl::Extractor;
/// # struct Fixture;
/// # impl Extractor for Fixture {
/// #     fn name(&self) -> &str { "fixture" }
/// #     fn extract(&self) -> Result<Dataset, EtlError> {
/// #         Dataset::from_rows(["pop"], vec![vec![Value::Integer(5)]])
/// #     }
/// # }
///
/// let chain = TransformationChain::new(vec![
///     RenameColumns::new([("pop", "population")]).unwrap().into(),
/// ]);
/// let schema = Schema::new([("population", LogicalType::Integer)]);
/// let loader = PrintLoader::new(Vec::new(), 5);
///
/// let report = Pipeline::new(Fixture, chain, schema, loader).run().unwrap();
/// assert_eq!(report.inserted_records, 1);
/// assert_eq!(report.state, PipelineState::Completed);
/// ```
pub struct Pipeline<E, T, L> {
    extractor: E,
    transformer: T,
    schema: Schema,
    loader: L,
    state: PipelineState,
    observer: Option<Box<dyn FnMut(PipelineState)>>,
}

impl<E, T, L> Pipeline<E, T, L>
where
    E: Extractor,
    T: Transformer,
    L: Loader,
{
    /// Create a new pipeline
    pub fn new(extractor: E, transformer: T, schema: Schema, loader: L) -> Self {
        Self {
            extractor,
            transformer,
            schema,
            loader,
            state: PipelineState::Created,
            observer: None,
        }
    }

    /// Call `observer` with every state the run enters, ending with
    /// `Completed` or `Failed`
    pub fn on_transition(mut self, observer: impl FnMut(PipelineState) + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Run the complete ETL pipeline
    ///
    /// Steps:
    /// 1. Extract the dataset from the source
    /// 2. Transform it
    /// 3. Validate it against the schema
    /// 4. Load it to the destination, exactly once
    ///
    /// # Errors
    /// Returns the first failure, tagged with the stage it happened in. No
    /// later stage runs after a failure and nothing is retried.
    pub fn run(mut self) -> Result<RunReport, PipelineError> {
        log::info!(
            "Starting ETL pipeline: {} -> {}",
            self.extractor.name(),
            self.loader.name()
        );

        match self.execute() {
            Ok(report) => {
                self.transition(PipelineState::Completed);
                log::info!("Pipeline {}", self.state);
                Ok(RunReport {
                    state: self.state,
                    ..report
                })
            }
            Err((stage, error)) => {
                self.transition(PipelineState::Failed(stage));
                log::error!("Pipeline failed while {}: {}", stage, error);
                Err(PipelineError { stage, error })
            }
        }
    }

    fn execute(&mut self) -> Result<RunReport, (Stage, EtlError)> {
        self.enter(Stage::Extracting);
        let raw = self
            .extractor
            .extract()
            .map_err(|e| (Stage::Extracting, as_extraction(self.extractor.name(), e)))?;
        log::info!("Extracted {} rows", raw.row_count());
        if raw.is_empty() {
            log::warn!("No rows extracted from {}", self.extractor.name());
        }

        self.enter(Stage::Transforming);
        let transformed = self
            .transformer
            .transform(&raw)
            .map_err(|e| (Stage::Transforming, as_step(self.transformer.name(), e)))?;
        log::info!(
            "Transformed {} rows into columns {:?}",
            transformed.row_count(),
            transformed.column_names()
        );

        self.enter(Stage::Validating);
        self.validate(&transformed)
            .map_err(|e| (Stage::Validating, e))?;

        self.enter(Stage::Loading);
        let inserted = self
            .loader
            .load(&transformed)
            .map_err(|e| (Stage::Loading, as_persistence(self.loader.name(), e)))?;
        log::info!("Loaded {} rows into {}", inserted, self.loader.name());

        Ok(RunReport {
            source_records: raw.row_count(),
            transformed_records: transformed.row_count(),
            inserted_records: inserted,
            state: self.state,
        })
    }

    fn validate(&self, dataset: &Dataset) -> Result<(), EtlError> {
        log::debug!("Validating against {} declared columns", self.schema.len());
        self.schema
            .validate(dataset)
            .map_err(EtlError::SchemaViolation)?;
        log::info!("Schema validation passed");
        Ok(())
    }

    fn enter(&mut self, stage: Stage) {
        self.transition(PipelineState::Running(stage));
    }

    fn transition(&mut self, next: PipelineState) {
        log::debug!("Pipeline {} -> {}", self.state, next);
        self.state = next;
        if let Some(observer) = self.observer.as_mut() {
            observer(next);
        }
    }
}

fn as_extraction(source: &str, error: EtlError) -> EtlError {
    match error {
        EtlError::Extraction { .. } => error,
        other => EtlError::extraction(source, other),
    }
}

fn as_step(name: &str, error: EtlError) -> EtlError {
    match error {
        EtlError::Transformation { .. } => error,
        other => EtlError::Transformation {
            step: 0,
            name: name.to_string(),
            source: Box::new(other),
        },
    }
}

fn as_persistence(target: &str, error: EtlError) -> EtlError {
    match error {
        EtlError::Persistence { .. } => error,
        other => EtlError::persistence(target, other),
    }
}
