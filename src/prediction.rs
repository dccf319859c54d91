//! Aggregates the votes of the current match set into a decision.
use crate::classifier::Phenotype;
use crate::population::Population;
use crate::schema::{DataSchema, PhenotypeInfo};
use rand::seq::SliceRandom;
use rand::Rng;

/// The outcome of one vote aggregation over a match set.
///
/// For a discrete task the decision is the class with the greatest summed
/// `fitness * numerosity` vote, ties broken uniformly at random, and
/// `probabilities` holds the normalized votes in class order (uniform when
/// every vote is zero). For a continuous task the decision is the
/// fitness-weighted mean of the advocated interval midpoints and
/// `probabilities` stays empty. An empty match set yields the `f64::NAN`
/// no-prediction sentinel.
#[derive(Clone, Debug)]
pub struct Prediction {
    pub decision: f64,
    pub probabilities: Vec<f64>,
    pub has_match: bool,
}

impl Prediction {
    pub fn new<R: Rng>(population: &Population, schema: &DataSchema, rng: &mut R) -> Self {
        let has_match = !population.match_set.is_empty();
        match &schema.phenotype {
            PhenotypeInfo::Discrete { classes } => {
                let mut votes = vec![0.0; classes.len()];
                for &index in &population.match_set {
                    let classifier = &population.classifiers[index];
                    if let Phenotype::Class(label) = classifier.phenotype {
                        if let Some(class_index) = schema.class_index(label) {
                            votes[class_index] +=
                                classifier.fitness * classifier.numerosity as f64;
                        }
                    }
                }
                let total: f64 = votes.iter().sum();
                let probabilities = if total > 0.0 {
                    votes.iter().map(|vote| vote / total).collect()
                } else {
                    vec![1.0 / classes.len() as f64; classes.len()]
                };
                let decision = if has_match {
                    let best = votes.iter().copied().fold(f64::MIN, f64::max);
                    let tied: Vec<usize> = votes
                        .iter()
                        .enumerate()
                        .filter(|(_, &vote)| vote == best)
                        .map(|(class_index, _)| class_index)
                        .collect();
                    classes[*tied.choose(rng).unwrap()]
                } else {
                    f64::NAN
                };
                Self {
                    decision,
                    probabilities,
                    has_match,
                }
            }
            PhenotypeInfo::Continuous { .. } => {
                let decision = if has_match {
                    let mut weighted_sum = 0.0;
                    let mut weight_sum = 0.0;
                    let mut midpoint_sum = 0.0;
                    for &index in &population.match_set {
                        let classifier = &population.classifiers[index];
                        if let Phenotype::Interval { low, high } = classifier.phenotype {
                            let midpoint = (low + high) / 2.0;
                            let weight = classifier.fitness * classifier.numerosity as f64;
                            weighted_sum += weight * midpoint;
                            weight_sum += weight;
                            midpoint_sum += midpoint;
                        }
                    }
                    if weight_sum > 0.0 {
                        weighted_sum / weight_sum
                    } else {
                        // all-zero fitness degenerates to the plain mean
                        midpoint_sum / population.match_set.len() as f64
                    }
                } else {
                    f64::NAN
                };
                Self {
                    decision,
                    probabilities: Vec::new(),
                    has_match,
                }
            }
        }
    }
}
