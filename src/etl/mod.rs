//! Core ETL (Extract, Transform, Load) abstractions
//!
//! This module provides the trait definitions a pipeline is assembled from
//! and the [`Pipeline`] that runs them: extract a dataset, transform it,
//! validate it against a schema and load it to a destination.

mod extract;
mod load;
mod pipeline;
mod transform;

pub use extract::Extractor;
pub use load::Loader;
pub use pipeline::{Pipeline, PipelineState, RunReport, Stage};
pub use transform::Transformer;
