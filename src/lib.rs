//! arcaneflow
//!
//! Small ETL pipelines: extract a [`Dataset`] from a [`DataSource`], reshape
//! it with a [`TransformationChain`], validate it against a [`Schema`] and
//! load it through a [`Loader`], most often into SQLite.

pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod etl;
pub mod schema;
pub mod source;
pub mod storage;
pub mod transform;

// Re-exports for convenience
pub use dataset::{Column, Dataset, LogicalType, Value};
pub use error::{EtlError, PipelineError};
pub use etl::{Extractor, Loader, Pipeline, PipelineState, RunReport, Stage, Transformer};
pub use schema::{Schema, Violation};
pub use source::{DataSource, SourceKind};
pub use storage::{ColumnModel, NdjsonWriter, PrintLoader, SqliteLoader, TableModel};
pub use transform::{Transformation, TransformationChain};
