//! Transformation wrapped with declared input and output schemas

use super::Transformation;
use crate::dataset::Dataset;
use crate::error::EtlError;
use crate::etl::Transformer;
use crate::schema::Schema;

/// A step that checks its input before running and its output after
///
/// Either schema may be left out. The declared schemas also let
/// [`TransformationChain::try_new`](super::TransformationChain::try_new)
/// reject neighbouring steps that disagree about the data passed between
/// them.
///
/// # Example
/// ```
/// use arcaneflow::dataset::{Dataset, LogicalType, Value};
/// use arcaneflow::etl::Transformer;
/// use arcaneflow::schema::Schema;
/// use arcaneflow::transform::{RenameColumns, Validated};
///
/// let step = Validated::new(RenameColumns::new([("pop", "population")]).unwrap())
///     .with_output(Schema::new([("population", LogicalType::Integer)]));
/// let input = Dataset::from_rows(["pop"], vec![vec![Value::from("twelve")]]).unwrap();
///
/// assert!(step.transform(&input).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Validated {
    inner: Box<Transformation>,
    input: Option<Schema>,
    output: Option<Schema>,
}

impl Validated {
    pub fn new(inner: impl Into<Transformation>) -> Self {
        Self {
            inner: Box::new(inner.into()),
            input: None,
            output: None,
        }
    }

    /// Schema the step's input must satisfy
    pub fn with_input(mut self, schema: Schema) -> Self {
        self.input = Some(schema);
        self
    }

    /// Schema the step's output must satisfy
    pub fn with_output(mut self, schema: Schema) -> Self {
        self.output = Some(schema);
        self
    }

    pub fn inner(&self) -> &Transformation {
        &self.inner
    }

    pub fn input_schema(&self) -> Option<&Schema> {
        self.input.as_ref()
    }

    pub fn output_schema(&self) -> Option<&Schema> {
        self.output.as_ref()
    }
}

impl Transformer for Validated {
    fn name(&self) -> &str {
        self.inner.name()
    }

    /// # Errors
    /// `SchemaViolation` when the input or the output breaks its declared
    /// schema, otherwise whatever the wrapped step returns.
    fn transform(&self, input: &Dataset) -> Result<Dataset, EtlError> {
        if let Some(schema) = &self.input {
            schema.validate(input).map_err(EtlError::SchemaViolation)?;
        }

        let output = self.inner.transform(input)?;

        if let Some(schema) = &self.output {
            schema.validate(&output).map_err(EtlError::SchemaViolation)?;
        }
        Ok(output)
    }
}
