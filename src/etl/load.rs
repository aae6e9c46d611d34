//! Loader trait for persisting datasets

use crate::dataset::Dataset;
use crate::error::EtlError;

/// Loader trait for handing a validated dataset to a destination
///
/// Implementors define how rows reach destinations:
/// - SQLite tables
/// - NDJSON files
/// - The terminal
///
/// # Example
/// ```
/// use arcaneflow::dataset::Dataset;
/// use arcaneflow::error::EtlError;
/// use arcaneflow::etl::Loader;
///
/// #[derive(Default)]
/// struct Counter {
///     rows: usize,
/// }
///
/// impl Loader for Counter {
///     fn name(&self) -> &str {
///         "counter"
///     }
///
///     fn load(&mut self, dataset: &Dataset) -> Result<usize, EtlError> {
///         self.rows += dataset.row_count();
///         Ok(dataset.row_count())
///     }
/// }
///
/// let mut counter = Counter::default();
/// counter.load(&Dataset::default()).unwrap();
/// assert_eq!(counter.rows, 0);
/// ```
pub trait Loader {
    /// Name of the destination, used in logs and errors
    fn name(&self) -> &str;

    /// Load the dataset to the destination
    ///
    /// Returns the number of rows successfully loaded
    ///
    /// # Errors
    /// Returns an error if loading fails (constraint violation, I/O, etc.)
    fn load(&mut self, dataset: &Dataset) -> Result<usize, EtlError>;
}

impl<L: Loader + ?Sized> Loader for &mut L {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn load(&mut self, dataset: &Dataset) -> Result<usize, EtlError> {
        (**self).load(dataset)
    }
}

impl<L: Loader + ?Sized> Loader for Box<L> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn load(&mut self, dataset: &Dataset) -> Result<usize, EtlError> {
        (**self).load(dataset)
    }
}
