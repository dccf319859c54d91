//! The attribute and phenotype schema derived from the training data.
//!
//! Every attribute is classified as discrete or continuous by counting its
//! unique values against [DiscreteAttributeLimit], or by an explicit listing
//! of attribute indices. Continuous attributes and continuous phenotypes
//! carry the observed `[min, max]` range, which seeds covering radii and
//! mutation step sizes.
use crate::errors::ElcsError;
use itertools::{Itertools, MinMaxResult};
use rustc_hash::FxHashSet;
use std::fmt;

/// Fallback unique-value threshold for phenotype classification when the
/// attribute kinds are given by explicit listing instead of a count.
pub const DEFAULT_UNIQUE_VALUE_LIMIT: usize = 10;

/// How attributes are split into discrete and continuous kinds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiscreteAttributeLimit {
    /// An attribute with at most this many unique values is discrete,
    /// otherwise continuous.
    UniqueValueLimit(usize),
    /// The listed attribute indices are continuous, all others discrete.
    ListedContinuous,
    /// The listed attribute indices are discrete, all others continuous.
    ListedDiscrete,
}

impl Default for DiscreteAttributeLimit {
    fn default() -> Self {
        DiscreteAttributeLimit::UniqueValueLimit(DEFAULT_UNIQUE_VALUE_LIMIT)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum AttributeInfo {
    Discrete,
    Continuous { min: f64, max: f64 },
}

#[derive(Clone, Debug, PartialEq)]
pub enum PhenotypeInfo {
    /// Class labels, sorted ascending so label order is reproducible.
    Discrete { classes: Vec<f64> },
    Continuous { min: f64, max: f64 },
}

#[derive(Clone, Debug)]
pub struct DataSchema {
    pub num_attributes: usize,
    pub attributes: Vec<AttributeInfo>,
    pub phenotype: PhenotypeInfo,
}

impl DataSchema {
    /// Analyzes the training data and builds the schema. Missing attribute
    /// values (`f64::NAN`) are ignored for unique-value counting and range
    /// detection. The `listed_attributes` indices feed the
    /// [DiscreteAttributeLimit] listing modes and must lie in
    /// `[0, num_attributes)`.
    pub fn from_data(
        x: &[Vec<f64>],
        y: &[f64],
        limit: &DiscreteAttributeLimit,
        listed_attributes: &[usize],
    ) -> Result<Self, ElcsError> {
        let num_attributes = x[0].len();
        if let Some(&out_of_range) = listed_attributes.iter().find(|&&a| a >= num_attributes) {
            return Err(ElcsError::InvalidHyperparameter(format!(
                "specified attribute index {} out of range for {} attributes",
                out_of_range, num_attributes
            )));
        }

        let attributes = (0..num_attributes)
            .map(|attribute| {
                let column = x.iter().map(move |row| row[attribute]);
                let discrete = match limit {
                    DiscreteAttributeLimit::UniqueValueLimit(n) => {
                        unique_value_count(column.clone()) <= *n
                    }
                    DiscreteAttributeLimit::ListedContinuous => {
                        !listed_attributes.contains(&attribute)
                    }
                    DiscreteAttributeLimit::ListedDiscrete => {
                        listed_attributes.contains(&attribute)
                    }
                };
                if discrete {
                    AttributeInfo::Discrete
                } else {
                    let (min, max) = observed_range(column);
                    AttributeInfo::Continuous { min, max }
                }
            })
            .collect();

        let phenotype_limit = match limit {
            DiscreteAttributeLimit::UniqueValueLimit(n) => *n,
            _ => DEFAULT_UNIQUE_VALUE_LIMIT,
        };
        let phenotype = if unique_value_count(y.iter().copied()) <= phenotype_limit {
            let mut classes: Vec<f64> = dedup_values(y.iter().copied());
            classes.sort_unstable_by(f64::total_cmp);
            PhenotypeInfo::Discrete { classes }
        } else {
            let (min, max) = observed_range(y.iter().copied());
            PhenotypeInfo::Continuous { min, max }
        };

        Ok(Self {
            num_attributes,
            attributes,
            phenotype,
        })
    }

    pub fn is_attribute_discrete(&self, attribute: usize) -> bool {
        matches!(self.attributes[attribute], AttributeInfo::Discrete)
    }

    pub fn attribute_range(&self, attribute: usize) -> Option<(f64, f64)> {
        match self.attributes[attribute] {
            AttributeInfo::Discrete => None,
            AttributeInfo::Continuous { min, max } => Some((min, max)),
        }
    }

    pub fn is_discrete_phenotype(&self) -> bool {
        matches!(self.phenotype, PhenotypeInfo::Discrete { .. })
    }

    pub fn classes(&self) -> Option<&[f64]> {
        match &self.phenotype {
            PhenotypeInfo::Discrete { classes } => Some(classes),
            PhenotypeInfo::Continuous { .. } => None,
        }
    }

    /// Position of a class label in the ordered class list, by exact value.
    pub fn class_index(&self, label: f64) -> Option<usize> {
        self.classes()
            .and_then(|classes| classes.iter().position(|&c| c == label))
    }

    pub fn phenotype_range(&self) -> Option<(f64, f64)> {
        match self.phenotype {
            PhenotypeInfo::Discrete { .. } => None,
            PhenotypeInfo::Continuous { min, max } => Some((min, max)),
        }
    }
}

impl fmt::Display for DataSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "schema:")?;
        writeln!(f, "  num_attributes: {}", self.num_attributes)?;
        let discrete_count = self
            .attributes
            .iter()
            .filter(|a| matches!(a, AttributeInfo::Discrete))
            .count();
        writeln!(
            f,
            "  attributes: {} discrete, {} continuous",
            discrete_count,
            self.num_attributes - discrete_count
        )?;
        match &self.phenotype {
            PhenotypeInfo::Discrete { classes } => {
                writeln!(f, "  phenotype: discrete, {} classes", classes.len())
            }
            PhenotypeInfo::Continuous { min, max } => {
                writeln!(f, "  phenotype: continuous, range [{}, {}]", min, max)
            }
        }
    }
}

/// Bit pattern for hashing a value, with both zeros mapped to one key so
/// `-0.0` and `0.0` stay a single value, as they are under `==`.
pub(crate) fn canonical_bits(value: f64) -> u64 {
    (if value == 0.0 { 0.0 } else { value }).to_bits()
}

fn unique_value_count(values: impl Iterator<Item = f64>) -> usize {
    values
        .filter(|v| !v.is_nan())
        .map(canonical_bits)
        .collect::<FxHashSet<u64>>()
        .len()
}

fn dedup_values(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut seen = FxHashSet::default();
    values
        .filter(|v| !v.is_nan())
        .filter(|v| seen.insert(canonical_bits(*v)))
        .collect()
}

fn observed_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    match values.filter(|v| !v.is_nan()).minmax_by(f64::total_cmp) {
        MinMaxResult::NoElements => (0.0, 0.0),
        MinMaxResult::OneElement(v) => (v, v),
        MinMaxResult::MinMax(min, max) => (min, max),
    }
}
