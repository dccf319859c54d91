//! A single condition/phenotype rule and its learned statistics.
//!
//! The condition only stores the specified attribute positions; every other
//! attribute is an implicit wildcard. Specified positions are kept sorted
//! ascending at all times so structurally equal rules compare equal and can
//! be folded into one macroclassifier by incrementing numerosity.
use crate::model::ElcsConfig;
use crate::schema::{AttributeInfo, DataSchema, PhenotypeInfo};
use rand::seq::SliceRandom;
use rand::Rng;
use std::fmt;
use std::mem;

/// One specified condition entry, parallel to an attribute index.
#[derive(Clone, Debug, PartialEq)]
pub enum ConditionElement {
    /// Exact value required of a discrete attribute.
    Value(f64),
    /// Closed interval required of a continuous attribute, `low <= high`.
    Interval { low: f64, high: f64 },
}

/// The advocated outcome of a rule.
#[derive(Clone, Debug, PartialEq)]
pub enum Phenotype {
    Class(f64),
    Interval { low: f64, high: f64 },
}

#[derive(Clone, Debug)]
pub struct Classifier {
    /// Attribute indices with a condition entry, sorted ascending.
    pub specified_attributes: Vec<usize>,
    /// Condition entries, parallel to `specified_attributes`.
    pub condition: Vec<ConditionElement>,
    pub phenotype: Phenotype,
    pub fitness: f64,
    pub accuracy: f64,
    /// Number of microclassifiers this macroclassifier represents.
    pub numerosity: usize,
    pub ave_match_set_size: f64,
    /// Iteration of the last genetic algorithm this rule participated in.
    pub time_stamp_ga: usize,
    pub init_time_stamp: usize,
    pub match_count: usize,
    pub correct_count: usize,
    pub deletion_vote: f64,
}

impl Classifier {
    /// Builds a covering rule for an instance the population could not serve.
    ///
    /// Each attribute with a present value is specified with probability
    /// `p_spec`; missing values yield no condition to build from and stay
    /// wildcards. Continuous conditions and continuous phenotypes get a
    /// radius drawn uniformly from half the observed range around the
    /// instance value, so the new rule always matches the instance and
    /// advocates its target.
    pub fn new_covering<R: Rng>(
        state: &[f64],
        target: f64,
        iteration: usize,
        match_set_size: usize,
        config: &ElcsConfig,
        schema: &DataSchema,
        rng: &mut R,
    ) -> Self {
        let mut specified_attributes = Vec::new();
        let mut condition = Vec::new();
        for (attribute, info) in schema.attributes.iter().enumerate() {
            let value = state[attribute];
            if value.is_nan() {
                continue;
            }
            if rng.gen::<f64>() < config.p_spec {
                specified_attributes.push(attribute);
                condition.push(condition_from_value(value, info, rng));
            }
        }
        let phenotype = match &schema.phenotype {
            PhenotypeInfo::Discrete { .. } => Phenotype::Class(target),
            PhenotypeInfo::Continuous { min, max } => {
                let radius = rng.gen::<f64>() * (max - min) / 2.0;
                Phenotype::Interval {
                    low: target - radius,
                    high: target + radius,
                }
            }
        };
        Self {
            specified_attributes,
            condition,
            phenotype,
            fitness: config.init_fit,
            accuracy: 1.0,
            numerosity: 1,
            ave_match_set_size: match_set_size as f64,
            time_stamp_ga: iteration,
            init_time_stamp: iteration,
            match_count: 0,
            correct_count: 0,
            deletion_vote: 0.0,
        }
    }

    /// Offspring seed: deep copy of the parent's condition and phenotype with
    /// reset counts and reduced fitness.
    pub fn new_copy(parent: &Classifier, iteration: usize, config: &ElcsConfig) -> Self {
        Self {
            specified_attributes: parent.specified_attributes.clone(),
            condition: parent.condition.clone(),
            phenotype: parent.phenotype.clone(),
            fitness: parent.fitness * config.fitness_reduction,
            accuracy: parent.accuracy,
            numerosity: 1,
            ave_match_set_size: parent.ave_match_set_size,
            time_stamp_ga: iteration,
            init_time_stamp: iteration,
            match_count: 0,
            correct_count: 0,
            deletion_vote: 0.0,
        }
    }

    /// Whether every specified position matches the instance state.
    /// A missing state value matches only when `match_for_missingness` is on.
    pub fn matches(&self, state: &[f64], config: &ElcsConfig) -> bool {
        for (&attribute, element) in self.specified_attributes.iter().zip(&self.condition) {
            let value = state[attribute];
            if value.is_nan() {
                if config.match_for_missingness {
                    continue;
                }
                return false;
            }
            match element {
                ConditionElement::Value(expected) => {
                    if value != *expected {
                        return false;
                    }
                }
                ConditionElement::Interval { low, high } => {
                    if value < *low || value > *high {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// Structural equality on `(specified_attributes, condition, phenotype)`,
    /// ignoring learned statistics. Both sides keep their specified lists
    /// sorted, so a plain element-wise comparison is canonical.
    pub fn same_rule(&self, other: &Classifier) -> bool {
        self.specified_attributes == other.specified_attributes
            && self.condition == other.condition
            && self.phenotype == other.phenotype
    }

    /// Uniform crossover between two offspring, in place.
    ///
    /// Candidates are the attributes specified in either offspring, visited
    /// in ascending order. Each participates with probability 0.5: a
    /// one-sided attribute is transferred whole (generalizing one offspring
    /// and specializing the other), a shared continuous attribute swaps one
    /// interval endpoint, a shared discrete attribute swaps values. A
    /// continuous phenotype swaps one endpoint with probability 0.5.
    /// Intervals are renormalized to `low <= high` after every swap.
    ///
    /// Returns whether any structural change happened.
    pub fn uniform_crossover<R: Rng>(&mut self, other: &mut Classifier, rng: &mut R) -> bool {
        let mut changed = false;
        let mut candidates: Vec<usize> = self
            .specified_attributes
            .iter()
            .chain(other.specified_attributes.iter())
            .copied()
            .collect();
        candidates.sort_unstable();
        candidates.dedup();

        for attribute in candidates {
            if rng.gen::<f64>() >= 0.5 {
                continue;
            }
            match (self.position_of(attribute), other.position_of(attribute)) {
                (Some(position), None) => {
                    let (attribute, element) = self.take_specified(position);
                    other.insert_specified(attribute, element);
                    changed = true;
                }
                (None, Some(position)) => {
                    let (attribute, element) = other.take_specified(position);
                    self.insert_specified(attribute, element);
                    changed = true;
                }
                (Some(self_position), Some(other_position)) => {
                    match (
                        &mut self.condition[self_position],
                        &mut other.condition[other_position],
                    ) {
                        (
                            ConditionElement::Interval {
                                low: self_low,
                                high: self_high,
                            },
                            ConditionElement::Interval {
                                low: other_low,
                                high: other_high,
                            },
                        ) => {
                            if rng.gen_bool(0.5) {
                                if self_low != other_low {
                                    changed = true;
                                }
                                mem::swap(self_low, other_low);
                            } else {
                                if self_high != other_high {
                                    changed = true;
                                }
                                mem::swap(self_high, other_high);
                            }
                            if self_low > self_high {
                                mem::swap(self_low, self_high);
                            }
                            if other_low > other_high {
                                mem::swap(other_low, other_high);
                            }
                        }
                        (
                            ConditionElement::Value(self_value),
                            ConditionElement::Value(other_value),
                        ) => {
                            if self_value != other_value {
                                mem::swap(self_value, other_value);
                                changed = true;
                            }
                        }
                        _ => {}
                    }
                }
                (None, None) => {}
            }
        }

        if let (
            Phenotype::Interval {
                low: self_low,
                high: self_high,
            },
            Phenotype::Interval {
                low: other_low,
                high: other_high,
            },
        ) = (&mut self.phenotype, &mut other.phenotype)
        {
            if rng.gen::<f64>() < 0.5 {
                if rng.gen_bool(0.5) {
                    if self_low != other_low {
                        changed = true;
                    }
                    mem::swap(self_low, other_low);
                } else {
                    if self_high != other_high {
                        changed = true;
                    }
                    mem::swap(self_high, other_high);
                }
                if self_low > self_high {
                    mem::swap(self_low, self_high);
                }
                if other_low > other_high {
                    mem::swap(other_low, other_high);
                }
            }
        }

        self.canonicalize();
        other.canonicalize();
        changed
    }

    /// Per-attribute mutation with probability `upsilon` each: specify an
    /// unspecified attribute from the instance, generalize a specified
    /// discrete one, or shift one endpoint of a specified interval by a step
    /// drawn from a tenth of the attribute range. The phenotype mutates with
    /// the same probability; a continuous phenotype interval is kept covering
    /// the instance target.
    ///
    /// Returns whether any structural change happened.
    pub fn mutate<R: Rng>(
        &mut self,
        state: &[f64],
        target: f64,
        config: &ElcsConfig,
        schema: &DataSchema,
        rng: &mut R,
    ) -> bool {
        let mut changed = false;
        for attribute in 0..schema.num_attributes {
            if rng.gen::<f64>() >= config.upsilon {
                continue;
            }
            match self.position_of(attribute) {
                None => {
                    let value = state[attribute];
                    if value.is_nan() {
                        continue;
                    }
                    let element = condition_from_value(value, &schema.attributes[attribute], rng);
                    self.insert_specified(attribute, element);
                    changed = true;
                }
                Some(position) => {
                    if matches!(self.condition[position], ConditionElement::Value(_)) {
                        self.take_specified(position);
                        changed = true;
                    } else if let ConditionElement::Interval { low, high } =
                        &mut self.condition[position]
                    {
                        let (min, max) = schema.attribute_range(attribute).unwrap_or((0.0, 0.0));
                        let step = (max - min) * 0.1;
                        let delta = rng.gen_range(-step..=step);
                        if rng.gen_bool(0.5) {
                            *low += delta;
                        } else {
                            *high += delta;
                        }
                        if low > high {
                            mem::swap(low, high);
                        }
                        changed = true;
                    }
                }
            }
        }

        match (&mut self.phenotype, &schema.phenotype) {
            (Phenotype::Class(current), PhenotypeInfo::Discrete { classes }) => {
                if rng.gen::<f64>() < config.upsilon {
                    let alternatives: Vec<f64> = classes
                        .iter()
                        .copied()
                        .filter(|&class| class != *current)
                        .collect();
                    if let Some(&new_class) = alternatives.choose(rng) {
                        *current = new_class;
                        changed = true;
                    }
                }
            }
            (Phenotype::Interval { low, high }, PhenotypeInfo::Continuous { min, max }) => {
                if rng.gen::<f64>() < config.upsilon {
                    let step = (max - min) * 0.1;
                    *low += rng.gen_range(-step..=step);
                    *high += rng.gen_range(-step..=step);
                    if low > high {
                        mem::swap(low, high);
                    }
                    // the target that bred this rule must stay covered
                    *low = low.min(target);
                    *high = high.max(target);
                    changed = true;
                }
            }
            _ => {}
        }

        changed
    }

    /// Per-instance statistics update, applied once per match-set membership.
    /// Both the average match-set size and the fitness use the running mean
    /// until experience exceeds `1 / beta`, then a recency-weighted update.
    pub fn update_stats(&mut self, match_set_size: usize, in_correct_set: bool, config: &ElcsConfig) {
        self.match_count += 1;
        let experience = self.match_count as f64;
        if experience > 1.0 / config.beta {
            self.ave_match_set_size +=
                config.beta * (match_set_size as f64 - self.ave_match_set_size);
        } else {
            self.ave_match_set_size = (self.ave_match_set_size * (experience - 1.0)
                + match_set_size as f64)
                / experience;
        }
        if in_correct_set {
            self.correct_count += 1;
        }
        self.accuracy = self.correct_count as f64 / self.match_count as f64;
        let accuracy_proxy = self.accuracy.powf(config.nu);
        if experience > 1.0 / config.beta {
            self.fitness += config.beta * (accuracy_proxy - self.fitness);
        } else {
            self.fitness = (self.fitness * (experience - 1.0) + accuracy_proxy) / experience;
        }
    }

    /// Experienced and accurate enough to absorb other rules.
    pub fn is_subsumer(&self, config: &ElcsConfig) -> bool {
        self.match_count > config.theta_sub && self.accuracy > config.acc_sub
    }

    /// Strictly more general condition: a proper subset of the other rule's
    /// specified attributes, with every shared interval enclosing the other's.
    pub fn is_more_general(&self, other: &Classifier) -> bool {
        if self.specified_attributes.len() >= other.specified_attributes.len() {
            return false;
        }
        for (position, &attribute) in self.specified_attributes.iter().enumerate() {
            let Some(other_position) = other.position_of(attribute) else {
                return false;
            };
            if let (
                ConditionElement::Interval { low, high },
                ConditionElement::Interval {
                    low: other_low,
                    high: other_high,
                },
            ) = (&self.condition[position], &other.condition[other_position])
            {
                if low > other_low || high < other_high {
                    return false;
                }
            }
        }
        true
    }

    /// Equal class for discrete phenotypes, enclosing interval for continuous.
    pub fn phenotype_subsumes(&self, other: &Classifier) -> bool {
        match (&self.phenotype, &other.phenotype) {
            (Phenotype::Class(class), Phenotype::Class(other_class)) => class == other_class,
            (
                Phenotype::Interval { low, high },
                Phenotype::Interval {
                    low: other_low,
                    high: other_high,
                },
            ) => low <= other_low && high >= other_high,
            _ => false,
        }
    }

    pub fn subsumes(&self, other: &Classifier, config: &ElcsConfig) -> bool {
        self.is_subsumer(config) && self.is_more_general(other) && self.phenotype_subsumes(other)
    }

    /// Roulette weight for deletion. Rules whose per-microclassifier fitness
    /// falls below `delta` times the population mean, once past the
    /// `theta_del` experience threshold, get their vote scaled up.
    pub fn compute_deletion_vote(&self, mean_fitness: f64, config: &ElcsConfig) -> f64 {
        let base_vote = self.ave_match_set_size * self.numerosity as f64;
        // floor guards against a zero-fitness division blowup
        let per_micro_fitness = (self.fitness / self.numerosity as f64).max(1e-12);
        if self.match_count > config.theta_del
            && per_micro_fitness < config.delta * mean_fitness
        {
            base_vote * mean_fitness / per_micro_fitness
        } else {
            base_vote
        }
    }

    /// Fraction of wildcard attributes.
    pub fn generality(&self, num_attributes: usize) -> f64 {
        (num_attributes - self.specified_attributes.len()) as f64 / num_attributes as f64
    }

    pub fn position_of(&self, attribute: usize) -> Option<usize> {
        self.specified_attributes
            .iter()
            .position(|&a| a == attribute)
    }

    fn take_specified(&mut self, position: usize) -> (usize, ConditionElement) {
        (
            self.specified_attributes.remove(position),
            self.condition.remove(position),
        )
    }

    fn insert_specified(&mut self, attribute: usize, element: ConditionElement) {
        let position = self.specified_attributes.partition_point(|&a| a < attribute);
        self.specified_attributes.insert(position, attribute);
        self.condition.insert(position, element);
    }

    /// Restores the ascending attribute order after structural edits.
    fn canonicalize(&mut self) {
        let mut pairs: Vec<(usize, ConditionElement)> = self
            .specified_attributes
            .drain(..)
            .zip(self.condition.drain(..))
            .collect();
        pairs.sort_by_key(|(attribute, _)| *attribute);
        for (attribute, element) in pairs {
            self.specified_attributes.push(attribute);
            self.condition.push(element);
        }
    }
}

fn condition_from_value<R: Rng>(value: f64, info: &AttributeInfo, rng: &mut R) -> ConditionElement {
    match info {
        AttributeInfo::Discrete => ConditionElement::Value(value),
        AttributeInfo::Continuous { min, max } => {
            let radius = rng.gen::<f64>() * (max - min) / 2.0;
            ConditionElement::Interval {
                low: value - radius,
                high: value + radius,
            }
        }
    }
}

impl fmt::Display for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.specified_attributes.is_empty() {
            write!(f, "#")?;
        }
        for (position, (&attribute, element)) in self
            .specified_attributes
            .iter()
            .zip(&self.condition)
            .enumerate()
        {
            if position > 0 {
                write!(f, ", ")?;
            }
            match element {
                ConditionElement::Value(value) => write!(f, "{}={}", attribute, value)?,
                ConditionElement::Interval { low, high } => {
                    write!(f, "{}=[{:.3}, {:.3}]", attribute, low, high)?
                }
            }
        }
        match &self.phenotype {
            Phenotype::Class(class) => write!(f, " => {}", class)?,
            Phenotype::Interval { low, high } => write!(f, " => [{:.3}, {:.3}]", low, high)?,
        }
        write!(
            f,
            " (fitness {:.3}, accuracy {:.3}, numerosity {})",
            self.fitness, self.accuracy, self.numerosity
        )
    }
}
