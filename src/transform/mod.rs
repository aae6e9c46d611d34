//! Transformation implementations for datasets
//!
//! Each transformation is its own type implementing
//! [`Transformer`](crate::etl::Transformer). [`Transformation`] closes them
//! into one enum so chains can hold any of them, including nested chains,
//! and dispatch statically. Every variant also reports a [`Signature`]: the
//! columns it reads and writes, which chain optimization relies on.

mod cast_columns;
mod chain;
mod drop_columns;
mod regex_replace;
mod rename_columns;
mod select_columns;
mod validated;

pub use cast_columns::CastColumns;
pub use chain::TransformationChain;
pub use drop_columns::DropColumns;
pub use regex_replace::RegexReplace;
pub use rename_columns::RenameColumns;
pub use select_columns::SelectColumns;
pub use validated::Validated;

use crate::dataset::Dataset;
use crate::error::EtlError;
use crate::etl::Transformer;
use crate::schema::Schema;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

/// Every built-in transformation
#[derive(Debug, Clone, PartialEq)]
pub enum Transformation {
    Rename(RenameColumns),
    Drop(DropColumns),
    Select(SelectColumns),
    Cast(CastColumns),
    RegexReplace(RegexReplace),
    Chain(TransformationChain),
    Validated(Validated),
}

impl Transformation {
    /// Column-level effect of the step
    pub fn signature(&self) -> Signature {
        match self {
            Self::Rename(t) => Signature {
                input: t.mapping().iter().map(|(old, _)| old.clone()).collect(),
                output: t.mapping().iter().map(|(_, new)| new.clone()).collect(),
                relabels: Some(t.mapping().to_vec()),
            },
            Self::Drop(t) => Signature::rewrite(t.columns().iter().cloned(), Vec::<String>::new()),
            Self::Select(t) => Signature::rewrite(t.columns().iter().cloned(), Vec::<String>::new()),
            Self::Cast(t) => {
                let columns: Vec<String> = t.columns().map(str::to_string).collect();
                Signature::rewrite(columns.clone(), columns)
            }
            Self::RegexReplace(t) => {
                Signature::rewrite([t.column().to_string()], [t.column().to_string()])
            }
            Self::Chain(t) => t.signature(),
            Self::Validated(t) => Signature {
                relabels: None,
                ..t.inner().signature()
            },
        }
    }

    /// Input schema the step declares, if any
    pub fn input_schema(&self) -> Option<&Schema> {
        match self {
            Self::Validated(t) => t.input_schema(),
            Self::Chain(t) => t.steps().first().and_then(Self::input_schema),
            _ => None,
        }
    }

    /// Output schema the step declares, if any
    pub fn output_schema(&self) -> Option<&Schema> {
        match self {
            Self::Validated(t) => t.output_schema(),
            Self::Chain(t) => t.steps().last().and_then(Self::output_schema),
            _ => None,
        }
    }
}

/// Which columns a step reads and which it writes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Signature {
    /// Columns that must exist before the step
    pub input: BTreeSet<String>,
    /// Columns the step writes, under their new names
    pub output: BTreeSet<String>,
    /// `(old, new)` pairs, set only when the step renames columns and
    /// leaves every cell as it was
    pub relabels: Option<Vec<(String, String)>>,
}

impl Signature {
    fn rewrite(
        input: impl IntoIterator<Item = String>,
        output: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            input: input.into_iter().collect(),
            output: output.into_iter().collect(),
            relabels: None,
        }
    }

    /// Signature of `steps` run in order
    fn compose<'a>(steps: impl IntoIterator<Item = &'a Transformation>) -> Self {
        let mut input = BTreeSet::new();
        let mut written: BTreeSet<String> = BTreeSet::new();
        let mut names = Some(BTreeMap::new());

        for step in steps {
            let signature = step.signature();
            input.extend(signature.input.difference(&written).cloned());
            written.retain(|column| !signature.input.contains(column));
            written.extend(signature.output);
            names = match (names, &signature.relabels) {
                (Some(names), Some(pairs)) => Some(relabel(&names, pairs)),
                _ => None,
            };
        }

        Self {
            input,
            output: written,
            relabels: names.map(|names| {
                names
                    .into_iter()
                    .map(|(current, original)| (original, current))
                    .collect()
            }),
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |columns: &BTreeSet<String>| {
            columns.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
        };
        write!(f, "[{}] -> [{}]", join(&self.input), join(&self.output))
    }
}

/// Apply rename pairs to a `current name -> original name` map
///
/// All pairs move at once, as [`RenameColumns`] does. Columns back under
/// their original name are left out, so two maps are equal exactly when
/// they describe the same arrangement of names.
pub(crate) fn relabel(
    names: &BTreeMap<String, String>,
    pairs: &[(String, String)],
) -> BTreeMap<String, String> {
    let moved: Vec<(String, String)> = pairs
        .iter()
        .map(|(old, new)| {
            let original = names.get(old).cloned().unwrap_or_else(|| old.clone());
            (new.clone(), original)
        })
        .collect();

    let mut next = names.clone();
    for (old, _) in pairs {
        next.remove(old);
    }
    next.extend(moved);
    next.retain(|current, original| current != original);
    next
}

impl Transformer for Transformation {
    fn name(&self) -> &str {
        match self {
            Self::Rename(t) => t.name(),
            Self::Drop(t) => t.name(),
            Self::Select(t) => t.name(),
            Self::Cast(t) => t.name(),
            Self::RegexReplace(t) => t.name(),
            Self::Chain(t) => t.name(),
            Self::Validated(t) => t.name(),
        }
    }

    fn transform(&self, input: &Dataset) -> Result<Dataset, EtlError> {
        match self {
            Self::Rename(t) => t.transform(input),
            Self::Drop(t) => t.transform(input),
            Self::Select(t) => t.transform(input),
            Self::Cast(t) => t.transform(input),
            Self::RegexReplace(t) => t.transform(input),
            Self::Chain(t) => t.transform(input),
            Self::Validated(t) => t.transform(input),
        }
    }
}

impl From<RenameColumns> for Transformation {
    fn from(t: RenameColumns) -> Self {
        Self::Rename(t)
    }
}

impl From<DropColumns> for Transformation {
    fn from(t: DropColumns) -> Self {
        Self::Drop(t)
    }
}

impl From<SelectColumns> for Transformation {
    fn from(t: SelectColumns) -> Self {
        Self::Select(t)
    }
}

impl From<CastColumns> for Transformation {
    fn from(t: CastColumns) -> Self {
        Self::Cast(t)
    }
}

impl From<RegexReplace> for Transformation {
    fn from(t: RegexReplace) -> Self {
        Self::RegexReplace(t)
    }
}

impl From<TransformationChain> for Transformation {
    fn from(t: TransformationChain) -> Self {
        Self::Chain(t)
    }
}

impl From<Validated> for Transformation {
    fn from(t: Validated) -> Self {
        Self::Validated(t)
    }
}

/// Fail with `MissingColumn` for the first name `input` lacks
pub(crate) fn require_columns<'a>(
    input: &Dataset,
    names: impl IntoIterator<Item = &'a str>,
) -> Result<(), EtlError> {
    match names.into_iter().find(|name| !input.has_column(name)) {
        Some(missing) => Err(EtlError::missing_column(missing)),
        None => Ok(()),
    }
}

/// Column list that is non-empty and free of repeats
pub(crate) fn distinct_names<I, S>(names: I) -> Result<Vec<String>, EtlError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let names: Vec<String> = names.into_iter().map(Into::into).collect();
    if names.is_empty() {
        return Err(EtlError::invalid("column list cannot be empty"));
    }

    let mut seen = HashSet::new();
    match names.iter().find(|name| !seen.insert(name.as_str())) {
        Some(repeated) => Err(EtlError::invalid(format!(
            "column '{}' is listed twice",
            repeated
        ))),
        None => Ok(names),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::LogicalType;

    fn set(columns: &[&str]) -> BTreeSet<String> {
        columns.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_rename_signature() {
        let rename: Transformation = RenameColumns::new([("pop", "population")]).unwrap().into();
        let signature = rename.signature();

        assert_eq!(signature.input, set(&["pop"]));
        assert_eq!(signature.output, set(&["population"]));
        assert_eq!(
            signature.relabels,
            Some(vec![("pop".to_string(), "population".to_string())])
        );
        assert_eq!(signature.to_string(), "[pop] -> [population]");
    }

    #[test]
    fn test_value_steps_do_not_relabel() {
        let cast: Transformation = CastColumns::new([("pop", LogicalType::Integer)])
            .unwrap()
            .into();
        assert_eq!(cast.signature().input, set(&["pop"]));
        assert_eq!(cast.signature().output, set(&["pop"]));
        assert_eq!(cast.signature().relabels, None);

        let drop: Transformation = DropColumns::new(["scratch"]).unwrap().into();
        assert_eq!(drop.signature().to_string(), "[scratch] -> []");
    }

    #[test]
    fn test_chain_signature_composes() {
        let chain: Transformation = TransformationChain::new(vec![
            RenameColumns::new([("pop", "population")]).unwrap().into(),
            CastColumns::new([("population", LogicalType::Integer)])
                .unwrap()
                .into(),
            DropColumns::new(["scratch"]).unwrap().into(),
        ])
        .into();

        let signature = chain.signature();
        assert_eq!(signature.input, set(&["pop", "scratch"]));
        assert_eq!(signature.output, set(&["population"]));
        assert_eq!(signature.relabels, None);
    }

    #[test]
    fn test_rename_only_chain_relabels_as_one() {
        let chain: Transformation = TransformationChain::new(vec![
            RenameColumns::new([("a", "b")]).unwrap().into(),
            RenameColumns::new([("b", "c")]).unwrap().into(),
        ])
        .into();
        assert_eq!(
            chain.signature().relabels,
            Some(vec![("a".to_string(), "c".to_string())])
        );
    }

    #[test]
    fn test_relabel_swap_and_back() {
        let swap = vec![
            ("a".to_string(), "b".to_string()),
            ("b".to_string(), "a".to_string()),
        ];
        let once = relabel(&BTreeMap::new(), &swap);
        assert_eq!(once.len(), 2);
        assert!(relabel(&once, &swap).is_empty());
    }
}
