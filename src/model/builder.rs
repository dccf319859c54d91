use super::{Elcs, ElcsConfig, SelectionMethod};
use crate::errors::ElcsError;
use crate::schema::DiscreteAttributeLimit;
use rand::rngs::SmallRng;
use rand::SeedableRng;

/// The builder for an [Elcs] model. Every hyperparameter has the documented
/// default; `build` validates ranges and seeds the generator.
///
/// # Example:
/// ```
/// use elcs::model::Elcs;
///
/// let model = Elcs::builder()
///     .with_learning_iterations(1000)
///     .with_max_population_size(200)
///     .with_random_seed(1)
///     .build()
///     .unwrap();
/// assert!(!model.is_trained());
/// ```
#[derive(Clone, Debug, Default)]
pub struct ElcsBuilder {
    config: ElcsConfig,
}

impl ElcsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_learning_iterations(mut self, learning_iterations: usize) -> Self {
        self.config.learning_iterations = learning_iterations;
        self
    }
    pub fn with_track_accuracy_while_fit(mut self, track_accuracy_while_fit: bool) -> Self {
        self.config.track_accuracy_while_fit = track_accuracy_while_fit;
        self
    }
    pub fn with_max_population_size(mut self, max_population_size: usize) -> Self {
        self.config.max_population_size = max_population_size;
        self
    }
    pub fn with_p_spec(mut self, p_spec: f64) -> Self {
        self.config.p_spec = p_spec;
        self
    }
    pub fn with_discrete_attribute_limit(mut self, limit: DiscreteAttributeLimit) -> Self {
        self.config.discrete_attribute_limit = limit;
        self
    }
    pub fn with_specified_attributes(mut self, specified_attributes: Vec<usize>) -> Self {
        self.config.specified_attributes = specified_attributes;
        self
    }
    pub fn with_nu(mut self, nu: f64) -> Self {
        self.config.nu = nu;
        self
    }
    pub fn with_chi(mut self, chi: f64) -> Self {
        self.config.chi = chi;
        self
    }
    pub fn with_upsilon(mut self, upsilon: f64) -> Self {
        self.config.upsilon = upsilon;
        self
    }
    pub fn with_theta_ga(mut self, theta_ga: f64) -> Self {
        self.config.theta_ga = theta_ga;
        self
    }
    pub fn with_theta_del(mut self, theta_del: usize) -> Self {
        self.config.theta_del = theta_del;
        self
    }
    pub fn with_theta_sub(mut self, theta_sub: usize) -> Self {
        self.config.theta_sub = theta_sub;
        self
    }
    pub fn with_acc_sub(mut self, acc_sub: f64) -> Self {
        self.config.acc_sub = acc_sub;
        self
    }
    pub fn with_beta(mut self, beta: f64) -> Self {
        self.config.beta = beta;
        self
    }
    pub fn with_delta(mut self, delta: f64) -> Self {
        self.config.delta = delta;
        self
    }
    pub fn with_init_fit(mut self, init_fit: f64) -> Self {
        self.config.init_fit = init_fit;
        self
    }
    pub fn with_fitness_reduction(mut self, fitness_reduction: f64) -> Self {
        self.config.fitness_reduction = fitness_reduction;
        self
    }
    pub fn with_do_correct_set_subsumption(mut self, do_correct_set_subsumption: bool) -> Self {
        self.config.do_correct_set_subsumption = do_correct_set_subsumption;
        self
    }
    pub fn with_do_ga_subsumption(mut self, do_ga_subsumption: bool) -> Self {
        self.config.do_ga_subsumption = do_ga_subsumption;
        self
    }
    pub fn with_selection_method(mut self, selection_method: SelectionMethod) -> Self {
        self.config.selection_method = selection_method;
        self
    }
    pub fn with_theta_sel(mut self, theta_sel: f64) -> Self {
        self.config.theta_sel = theta_sel;
        self
    }
    pub fn with_random_seed(mut self, random_seed: u64) -> Self {
        self.config.random_seed = Some(random_seed);
        self
    }
    pub fn with_match_for_missingness(mut self, match_for_missingness: bool) -> Self {
        self.config.match_for_missingness = match_for_missingness;
        self
    }

    pub fn build(self) -> Result<Elcs, ElcsError> {
        let config = self.config;
        if config.max_population_size < 1 {
            return Err(ElcsError::InvalidHyperparameter(
                "max_population_size must be at least 1".to_string(),
            ));
        }
        let unit_interval_parameters = [
            ("p_spec", config.p_spec),
            ("chi", config.chi),
            ("upsilon", config.upsilon),
            ("acc_sub", config.acc_sub),
            ("theta_sel", config.theta_sel),
            ("init_fit", config.init_fit),
            ("fitness_reduction", config.fitness_reduction),
        ];
        for (name, value) in unit_interval_parameters {
            if !(0.0..=1.0).contains(&value) {
                return Err(ElcsError::InvalidHyperparameter(format!(
                    "{} must be between 0 and 1",
                    name
                )));
            }
        }
        // the experience gate divides by beta
        if !(config.beta > 0.0) {
            return Err(ElcsError::InvalidHyperparameter(
                "beta must be positive".to_string(),
            ));
        }
        if !config.delta.is_finite() {
            return Err(ElcsError::InvalidHyperparameter(
                "delta must be finite".to_string(),
            ));
        }
        if !config.theta_ga.is_finite() || config.theta_ga < 0.0 {
            return Err(ElcsError::InvalidHyperparameter(
                "theta_ga must be nonnegative and finite".to_string(),
            ));
        }
        if !config.nu.is_finite() {
            return Err(ElcsError::InvalidHyperparameter(
                "nu must be finite".to_string(),
            ));
        }
        let rng = match config.random_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Ok(Elcs {
            config,
            rng,
            environment: None,
            population: None,
            has_trained: false,
            rolling_accuracy: Vec::new(),
        })
    }
}
