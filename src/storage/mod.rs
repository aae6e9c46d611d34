//! Load destinations
//!
//! This module holds every [`Loader`](crate::etl::Loader) the crate ships:
//! - SQLite tables described by a [`TableModel`]
//! - NDJSON files
//! - A terminal preview

mod model;
mod ndjson;
mod print;
mod sqlite;

pub use model::{ColumnModel, TableModel};
pub use ndjson::NdjsonWriter;
pub use print::PrintLoader;
pub use sqlite::{DEFAULT_BATCH_SIZE, SqliteLoader};
