//! Convenience re-exports of the public surface.
pub use crate::classifier::{Classifier, ConditionElement, Phenotype};
pub use crate::environment::Environment;
pub use crate::errors::ElcsError;
pub use crate::model::{Elcs, ElcsBuilder, ElcsConfig, SelectionMethod};
pub use crate::population::Population;
pub use crate::prediction::Prediction;
pub use crate::schema::{
    AttributeInfo, DataSchema, DiscreteAttributeLimit, PhenotypeInfo,
};
