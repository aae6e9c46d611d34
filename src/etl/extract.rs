//! Extractor trait for materializing datasets from sources

use crate::dataset::Dataset;
use crate::error::EtlError;

/// Extractor trait for extracting a dataset from a source
///
/// Implementors define how to materialize a dataset from sources like:
/// - CSV, Excel and JSON files
/// - HTTP APIs
/// - In-memory fixtures
///
/// # Example
/// ```
/// use arcaneflow::dataset::{Dataset, Value};
/// use arcaneflow::error::EtlError;
/// use arcaneflow::etl::Extractor;
///
/// struct Fixture;
///
/// impl Extractor for Fixture {
///     fn name(&self) -> &str {
///         "fixture"
///     }
///
///     fn extract(&self) -> Result<Dataset, EtlError> {
///         Dataset::from_rows(["id"], vec![vec![Value::Integer(1)]])
///     }
/// }
///
/// assert_eq!(Fixture.extract().unwrap().row_count(), 1);
/// ```
pub trait Extractor {
    /// Name used in logs and errors
    fn name(&self) -> &str;

    /// Extract the dataset from the source
    ///
    /// # Errors
    /// Returns an error if extraction fails (missing file, malformed input,
    /// network failure, etc.)
    fn extract(&self) -> Result<Dataset, EtlError>;
}

impl<E: Extractor + ?Sized> Extractor for Box<E> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn extract(&self) -> Result<Dataset, EtlError> {
        (**self).extract()
    }
}
