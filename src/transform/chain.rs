//! Ordered, nestable composition of transformations

use super::{Signature, Transformation, relabel};
use crate::dataset::Dataset;
use crate::error::EtlError;
use crate::etl::Transformer;
use std::collections::BTreeMap;

const DEFAULT_NAME: &str = "chain";

/// Applies its steps left to right, feeding each step's output to the next
///
/// A chain is itself a [`Transformer`] and a [`Transformation`] variant, so
/// chains nest; a nested chain counts as one step of its parent. An empty
/// chain returns its input unchanged.
///
/// # Example
/// ```
/// use arcaneflow::dataset::{Dataset, Value};
/// use arcaneflow::etl::Transformer;
/// use arcaneflow::transform::{DropColumns, RenameColumns, TransformationChain};
///
/// let chain = TransformationChain::new(vec![
///     RenameColumns::new([("pop", "population")]).unwrap().into(),
///     DropColumns::new(["scratch"]).unwrap().into(),
/// ]);
/// let input = Dataset::from_rows(
///     ["pop", "scratch"],
///     vec![vec![Value::Integer(5), Value::Null]],
/// )
/// .unwrap();
///
/// let output = chain.transform(&input).unwrap();
/// assert_eq!(output.column_names(), vec!["population"]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TransformationChain {
    name: String,
    steps: Vec<Transformation>,
}

impl TransformationChain {
    pub fn new(steps: Vec<Transformation>) -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            steps,
        }
    }

    /// Like [`TransformationChain::new`], but neighbouring steps that both
    /// declare schemas must agree: the output schema of a step has to match
    /// the input schema of the next one.
    ///
    /// # Errors
    /// Returns `InvalidConfiguration` naming the first disagreeing pair.
    pub fn try_new(steps: Vec<Transformation>) -> Result<Self, EtlError> {
        check_neighbours(&steps)?;
        Ok(Self::new(steps))
    }

    /// Name reported when this chain fails as a step of another chain
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// A new chain with `step` appended; `self` is left as it was
    pub fn append(&self, step: impl Into<Transformation>) -> Self {
        let mut steps = self.steps.clone();
        steps.push(step.into());
        Self {
            name: self.name.clone(),
            steps,
        }
    }

    /// [`append`](Self::append), checking the new step against the last
    /// one as [`try_new`](Self::try_new) does
    pub fn try_append(&self, step: impl Into<Transformation>) -> Result<Self, EtlError> {
        let chain = self.append(step);
        check_neighbours(&chain.steps)?;
        Ok(chain)
    }

    pub fn steps(&self) -> &[Transformation] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Combined signature of the steps, in order
    pub fn signature(&self) -> Signature {
        Signature::compose(&self.steps)
    }

    /// A copy of the chain without steps that cancel out
    ///
    /// Consecutive steps that only rename columns are followed as one
    /// arrangement of names. Whenever the names come back to an earlier
    /// arrangement, the steps in between are removed: a rename `a -> a` on
    /// its own, or `a -> b` followed by `b -> a`. Any other step ends the
    /// run. Nested chains are optimized first and then count as one step.
    ///
    /// A run that succeeds produces the same dataset with either chain.
    pub fn optimize(&self) -> Self {
        let mut kept: Vec<Transformation> = Vec::with_capacity(self.steps.len());
        // Names after each kept step of the current run, current -> original
        let mut states: Vec<BTreeMap<String, String>> = vec![BTreeMap::new()];
        let mut run_start = 0;

        for step in &self.steps {
            let step = match step {
                Transformation::Chain(inner) => Transformation::Chain(inner.optimize()),
                other => other.clone(),
            };

            let Some(pairs) = step.signature().relabels else {
                kept.push(step);
                states.truncate(1);
                run_start = kept.len();
                continue;
            };

            let current = states.last().cloned().unwrap_or_default();
            let next = relabel(&current, &pairs);
            match states.iter().position(|state| *state == next) {
                Some(back) => {
                    let keep = run_start + back;
                    log::debug!(
                        "{}: removing {} step(s) that leave column names unchanged",
                        self.name,
                        kept.len() + 1 - keep
                    );
                    kept.truncate(keep);
                    states.truncate(back + 1);
                }
                None => {
                    kept.push(step);
                    states.push(next);
                }
            }
        }

        if kept.len() < self.steps.len() {
            log::info!(
                "Optimized chain '{}' from {} to {} step(s)",
                self.name,
                self.steps.len(),
                kept.len()
            );
        }

        Self {
            name: self.name.clone(),
            steps: kept,
        }
    }
}

fn check_neighbours(steps: &[Transformation]) -> Result<(), EtlError> {
    for (index, pair) in steps.windows(2).enumerate() {
        let (before, after) = (&pair[0], &pair[1]);
        if let (Some(produced), Some(expected)) = (before.output_schema(), after.input_schema())
            && !produced.is_equivalent(expected)
        {
            return Err(EtlError::invalid(format!(
                "schema mismatch between steps {} and {}: {} produces {{{}}} but {} expects {{{}}}",
                index,
                index + 1,
                before.name(),
                produced,
                after.name(),
                expected
            )));
        }
    }
    Ok(())
}

impl Default for TransformationChain {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Transformer for TransformationChain {
    fn name(&self) -> &str {
        &self.name
    }

    /// # Errors
    /// The first failing step aborts the chain with
    /// `EtlError::Transformation`, carrying the step index and name.
    fn transform(&self, input: &Dataset) -> Result<Dataset, EtlError> {
        let mut output: Option<Dataset> = None;

        for (step, transformation) in self.steps.iter().enumerate() {
            log::debug!(
                "{}: step {} ({})",
                self.name,
                step,
                transformation.name()
            );
            let current = output.as_ref().unwrap_or(input);
            let next = transformation
                .transform(current)
                .map_err(|source| EtlError::Transformation {
                    step,
                    name: transformation.name().to_string(),
                    source: Box::new(source),
                })?;
            output = Some(next);
        }

        Ok(output.unwrap_or_else(|| input.clone()))
    }
}
