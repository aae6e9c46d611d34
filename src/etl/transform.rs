//! Transformer trait for dataset transformation

use crate::dataset::Dataset;
use crate::error::EtlError;

/// Transformer trait for turning one dataset into another
///
/// Implementors define one pure operation, for example:
/// - Renaming, dropping or selecting columns
/// - Converting cell types
/// - Rewriting text
///
/// A transformer never modifies its input; it returns a new dataset.
/// Configuration is fixed when the transformer is built.
///
/// # Example
/// ```
/// use arcaneflow::dataset::{Column, Dataset};
/// use arcaneflow::error::EtlError;
/// use arcaneflow::etl::Transformer;
///
/// struct Uppercase;
///
/// impl Transformer for Uppercase {
///     fn name(&self) -> &str {
///         "uppercase"
///     }
///
///     fn transform(&self, input: &Dataset) -> Result<Dataset, EtlError> {
///         Dataset::new(
///             input
///                 .columns()
///                 .iter()
///                 .map(|c| c.renamed(c.name().to_uppercase()))
///                 .collect(),
///         )
///     }
/// }
///
/// let data = Dataset::new(vec![Column::new("id", vec![])]).unwrap();
/// assert_eq!(Uppercase.transform(&data).unwrap().column_names(), vec!["ID"]);
/// ```
pub trait Transformer {
    /// Name used in logs and in step errors
    fn name(&self) -> &str;

    /// Transform a dataset
    ///
    /// # Errors
    /// Returns an error if a referenced column is missing or a value cannot
    /// be converted
    fn transform(&self, input: &Dataset) -> Result<Dataset, EtlError>;
}

impl<T: Transformer + ?Sized> Transformer for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn transform(&self, input: &Dataset) -> Result<Dataset, EtlError> {
        (**self).transform(input)
    }
}
