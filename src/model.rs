//! The learner: hyperparameters, the training loop and the inference entry
//! points.
//!
//! Training interleaves, per instance: match-set construction (with covering
//! on demand), optional rolling-accuracy tracking, correct-set construction,
//! statistics updates, optional correct-set subsumption, the genetic
//! algorithm, deletion, and clearing of the transient sets. Execution is
//! strictly single-threaded; with a fixed `random_seed` two runs over the
//! same data produce identical populations.
mod builder;

pub use self::builder::ElcsBuilder;

use crate::environment::Environment;
use crate::errors::ElcsError;
use crate::population::Population;
use crate::prediction::Prediction;
use crate::schema::{canonical_bits, DataSchema, DiscreteAttributeLimit, PhenotypeInfo};
use rand::rngs::SmallRng;
use rustc_hash::FxHashMap;

/// Moving-window length for the rolling training accuracy.
const TRACKING_WINDOW: usize = 50;

/// Genetic algorithm parent selection method.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SelectionMethod {
    Tournament,
    Roulette,
}

/// All hyperparameters of the learner. Field names follow the learning
/// classifier system literature.
#[derive(Clone, Debug)]
pub struct ElcsConfig {
    /// Number of training cycles.
    pub learning_iterations: usize,
    /// Keep a moving-window accuracy estimate during training.
    pub track_accuracy_while_fit: bool,
    /// Maximum microclassifier population size (sum of numerosities).
    pub max_population_size: usize,
    /// Probability of specifying an attribute during covering.
    pub p_spec: f64,
    /// How attributes are classified as discrete or continuous.
    pub discrete_attribute_limit: DiscreteAttributeLimit,
    /// Attribute indices feeding the listing modes of
    /// `discrete_attribute_limit`.
    pub specified_attributes: Vec<usize>,
    /// Power parameter weighting high accuracy in the fitness update.
    pub nu: f64,
    /// Crossover probability.
    pub chi: f64,
    /// Per-allele mutation probability.
    pub upsilon: f64,
    /// The genetic algorithm runs when the mean correct-set age exceeds this.
    pub theta_ga: f64,
    /// Experience threshold changing the deletion vote calculation.
    pub theta_del: usize,
    /// Experience threshold for subsumption capability.
    pub theta_sub: usize,
    /// Accuracy threshold for subsumption capability.
    pub acc_sub: f64,
    /// Learning rate for the match-set size and fitness updates.
    pub beta: f64,
    /// Fraction of the mean fitness below which deletion votes are scaled up.
    pub delta: f64,
    /// Initial fitness of a covering rule.
    pub init_fit: f64,
    /// Fitness reduction applied to offspring copies.
    pub fitness_reduction: f64,
    /// Run subsumption inside the correct set after its statistics update.
    pub do_correct_set_subsumption: bool,
    /// Let parents absorb offspring they subsume instead of inserting them.
    pub do_ga_subsumption: bool,
    pub selection_method: SelectionMethod,
    /// Fraction of the correct set sampled into each tournament.
    pub theta_sel: f64,
    /// Fixed seed for reproducible runs; entropy-seeded when absent.
    pub random_seed: Option<u64>,
    /// Let missing state values match specified conditions.
    pub match_for_missingness: bool,
}

impl Default for ElcsConfig {
    fn default() -> Self {
        Self {
            learning_iterations: 10_000,
            track_accuracy_while_fit: false,
            max_population_size: 1000,
            p_spec: 0.5,
            discrete_attribute_limit: DiscreteAttributeLimit::default(),
            specified_attributes: Vec::new(),
            nu: 5.0,
            chi: 0.8,
            upsilon: 0.04,
            theta_ga: 25.0,
            theta_del: 20,
            theta_sub: 20,
            acc_sub: 0.99,
            beta: 0.2,
            delta: 0.1,
            init_fit: 0.01,
            fitness_reduction: 0.1,
            do_correct_set_subsumption: false,
            do_ga_subsumption: true,
            selection_method: SelectionMethod::Tournament,
            theta_sel: 0.5,
            random_seed: None,
            match_for_missingness: false,
        }
    }
}

/// A supervised rule-learning classifier system.
///
/// Built through [ElcsBuilder], trained once with [fit](Elcs::fit), then
/// queried with [predict](Elcs::predict), [predict_proba](Elcs::predict_proba)
/// and [score](Elcs::score). All randomness of training and inference draws
/// from one generator seeded at construction.
pub struct Elcs {
    pub config: ElcsConfig,
    rng: SmallRng,
    environment: Option<Environment>,
    population: Option<Population>,
    has_trained: bool,
    rolling_accuracy: Vec<f64>,
}

impl Elcs {
    pub fn builder() -> ElcsBuilder {
        ElcsBuilder::new()
    }

    /// Trains the model on an instance table. Attribute values must be finite
    /// or `f64::NAN` for missing; targets must be finite.
    pub fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<(), ElcsError> {
        if self.has_trained {
            return Err(ElcsError::IllegalState(
                "model is already trained".to_string(),
            ));
        }
        validate_training_data(x, y)?;
        let schema = DataSchema::from_data(
            x,
            y,
            &self.config.discrete_attribute_limit,
            &self.config.specified_attributes,
        )?;
        log::debug!("{}", schema);

        let mut environment = Environment::new(x.to_vec(), y.to_vec(), schema);
        let mut population = Population::new();
        let mut tracking_window: Vec<f64> = Vec::with_capacity(TRACKING_WINDOW);

        for iteration in 0..self.config.learning_iterations {
            let (state, target) = environment.current_instance();
            let schema = &environment.schema;

            population.make_match_set(state, target, iteration, &self.config, schema, &mut self.rng);
            if self.config.track_accuracy_while_fit {
                let prediction = Prediction::new(&population, schema, &mut self.rng);
                if tracking_window.len() == TRACKING_WINDOW {
                    tracking_window.remove(0);
                }
                tracking_window.push(prediction_outcome(&prediction, target, schema));
                self.rolling_accuracy
                    .push(stats::mean(tracking_window.iter().copied()));
            }
            population.make_correct_set(target);
            population.update_sets(&self.config);
            if self.config.do_correct_set_subsumption {
                population.do_correct_set_subsumption(&self.config);
            }
            population.run_ga(iteration, state, target, &self.config, schema, &mut self.rng);
            population.deletion(&self.config, &mut self.rng);
            population.clear_sets();

            environment.advance();
        }
        log::debug!("{}", population);

        self.environment = Some(environment);
        self.population = Some(population);
        self.has_trained = true;
        Ok(())
    }

    /// Predicts the phenotype of each row. Rows no rule matches yield the
    /// `f64::NAN` no-prediction sentinel.
    pub fn predict(&mut self, x: &[Vec<f64>]) -> Result<Vec<f64>, ElcsError> {
        let (Some(population), Some(environment)) =
            (self.population.as_mut(), self.environment.as_ref())
        else {
            return Err(untrained_error());
        };
        validate_inference_rows(x, environment.schema.num_attributes)?;
        let mut predictions = Vec::with_capacity(x.len());
        for state in x {
            population.make_eval_match_set(state, &self.config);
            let prediction = Prediction::new(population, &environment.schema, &mut self.rng);
            population.clear_sets();
            predictions.push(prediction.decision);
        }
        Ok(predictions)
    }

    /// Per-class probabilities for each row, in ascending class-label order.
    /// Only available for discrete phenotypes.
    pub fn predict_proba(&mut self, x: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ElcsError> {
        let (Some(population), Some(environment)) =
            (self.population.as_mut(), self.environment.as_ref())
        else {
            return Err(untrained_error());
        };
        if !environment.schema.is_discrete_phenotype() {
            return Err(ElcsError::IllegalState(
                "class probabilities require a discrete phenotype".to_string(),
            ));
        }
        validate_inference_rows(x, environment.schema.num_attributes)?;
        let mut probabilities = Vec::with_capacity(x.len());
        for state in x {
            population.make_eval_match_set(state, &self.config);
            let prediction = Prediction::new(population, &environment.schema, &mut self.rng);
            population.clear_sets();
            probabilities.push(prediction.probabilities);
        }
        Ok(probabilities)
    }

    /// Balanced accuracy: the mean recall over the classes present in `y`.
    /// Rows without a matching rule count as incorrect. Only available for
    /// discrete phenotypes.
    pub fn score(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<f64, ElcsError> {
        {
            let Some(environment) = self.environment.as_ref() else {
                return Err(untrained_error());
            };
            if !environment.schema.is_discrete_phenotype() {
                return Err(ElcsError::IllegalState(
                    "balanced accuracy requires a discrete phenotype".to_string(),
                ));
            }
        }
        if x.is_empty() {
            return Err(ElcsError::InvalidInput("test set is empty".to_string()));
        }
        if y.len() != x.len() {
            return Err(ElcsError::InvalidInput(format!(
                "{} rows but {} targets",
                x.len(),
                y.len()
            )));
        }
        if y.iter().any(|value| !value.is_finite()) {
            return Err(ElcsError::InvalidInput(
                "targets must be finite".to_string(),
            ));
        }
        let predictions = self.predict(x)?;
        let mut per_class: FxHashMap<u64, (usize, usize)> = FxHashMap::default();
        for (&truth, &prediction) in y.iter().zip(&predictions) {
            let (correct, total) = per_class.entry(canonical_bits(truth)).or_insert((0, 0));
            *total += 1;
            if prediction == truth {
                *correct += 1;
            }
        }
        let recall_sum: f64 = per_class
            .values()
            .map(|&(correct, total)| correct as f64 / total as f64)
            .sum();
        Ok(recall_sum / per_class.len() as f64)
    }

    /// Balanced accuracy on the training data the model was fit with.
    pub fn training_score(&mut self) -> Result<f64, ElcsError> {
        let (x, y) = {
            let Some(environment) = self.environment.as_ref() else {
                return Err(untrained_error());
            };
            (
                environment.instances().to_vec(),
                environment.targets().to_vec(),
            )
        };
        self.score(&x, &y)
    }

    /// Fraction of training instances matched by at least one rule.
    pub fn training_instance_coverage(&mut self) -> Result<f64, ElcsError> {
        let (Some(population), Some(environment)) =
            (self.population.as_mut(), self.environment.as_ref())
        else {
            return Err(untrained_error());
        };
        let mut covered = 0;
        for state in environment.instances() {
            population.make_eval_match_set(state, &self.config);
            if !population.match_set.is_empty() {
                covered += 1;
            }
            population.clear_sets();
        }
        Ok(covered as f64 / environment.num_instances() as f64)
    }

    /// Per attribute, the summed numerosity of rules specifying it.
    pub fn attribute_specificity_list(&self) -> Result<Vec<usize>, ElcsError> {
        let (Some(population), Some(environment)) =
            (self.population.as_ref(), self.environment.as_ref())
        else {
            return Err(untrained_error());
        };
        Ok(population.attribute_specificity_list(&environment.schema))
    }

    /// Per attribute, the summed accuracy-weighted numerosity of rules
    /// specifying it.
    pub fn attribute_accuracy_list(&self) -> Result<Vec<f64>, ElcsError> {
        let (Some(population), Some(environment)) =
            (self.population.as_ref(), self.environment.as_ref())
        else {
            return Err(untrained_error());
        };
        Ok(population.attribute_accuracy_list(&environment.schema))
    }

    /// Moving-window training accuracy per iteration, populated when
    /// `track_accuracy_while_fit` is on.
    pub fn rolling_accuracy(&self) -> &[f64] {
        &self.rolling_accuracy
    }

    pub fn population(&self) -> Option<&Population> {
        self.population.as_ref()
    }

    pub fn schema(&self) -> Option<&DataSchema> {
        self.environment.as_ref().map(|environment| &environment.schema)
    }

    pub fn is_trained(&self) -> bool {
        self.has_trained
    }
}

fn untrained_error() -> ElcsError {
    ElcsError::IllegalState("model is not trained yet".to_string())
}

fn prediction_outcome(prediction: &Prediction, target: f64, schema: &DataSchema) -> f64 {
    match &schema.phenotype {
        PhenotypeInfo::Discrete { .. } => {
            if prediction.decision == target {
                1.0
            } else {
                0.0
            }
        }
        PhenotypeInfo::Continuous { min, max } => {
            let range = max - min;
            if prediction.decision.is_finite() && range > 0.0 {
                1.0 - (prediction.decision - target).abs() / range
            } else {
                0.0
            }
        }
    }
}

fn validate_training_data(x: &[Vec<f64>], y: &[f64]) -> Result<(), ElcsError> {
    if x.is_empty() {
        return Err(ElcsError::InvalidInput("training set is empty".to_string()));
    }
    let num_attributes = x[0].len();
    if num_attributes == 0 {
        return Err(ElcsError::InvalidInput(
            "instances need at least one attribute".to_string(),
        ));
    }
    if x.iter().any(|row| row.len() != num_attributes) {
        return Err(ElcsError::InvalidInput(
            "instance rows differ in length".to_string(),
        ));
    }
    if x.iter().flatten().any(|value| value.is_infinite()) {
        return Err(ElcsError::InvalidInput(
            "attribute values must be finite or missing".to_string(),
        ));
    }
    if y.len() != x.len() {
        return Err(ElcsError::InvalidInput(format!(
            "{} instances but {} targets",
            x.len(),
            y.len()
        )));
    }
    if y.iter().any(|value| !value.is_finite()) {
        return Err(ElcsError::InvalidInput(
            "targets must be finite".to_string(),
        ));
    }
    Ok(())
}

fn validate_inference_rows(x: &[Vec<f64>], num_attributes: usize) -> Result<(), ElcsError> {
    if x.iter().any(|row| row.len() != num_attributes) {
        return Err(ElcsError::InvalidInput(format!(
            "test rows must have {} attributes",
            num_attributes
        )));
    }
    if x.iter().flatten().any(|value| value.is_infinite()) {
        return Err(ElcsError::InvalidInput(
            "attribute values must be finite or missing".to_string(),
        ));
    }
    Ok(())
}
