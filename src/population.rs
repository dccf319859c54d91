//! The rule population and the per-iteration match and correct sets.
//!
//! The population exclusively owns every [Classifier]; `match_set` and
//! `correct_set` hold indices into `classifiers` that are only valid until
//! the next `clear_sets` call. Any removal of a macroclassifier repairs both
//! transient sets in the same step, so live indices never dangle.
//!
//! Random draw order per training iteration, which reproducibility depends
//! on: covering draws a specification gate per present attribute with its
//! radius where continuous, then the phenotype radius, while the match set is
//! built; the genetic algorithm draws the first parent, the second parent,
//! a crossover gate when the parents differ, the crossover swaps in
//! ascending attribute order, then mutation for the first and the second
//! offspring; deletion draws one roulette pick per removed microclassifier.
use crate::classifier::{Classifier, Phenotype};
use crate::model::{ElcsConfig, SelectionMethod};
use crate::schema::{DataSchema, PhenotypeInfo};
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;
use std::fmt;

#[derive(Clone, Debug, Default)]
pub struct Population {
    /// The macroclassifiers. No two entries are structurally equal.
    pub classifiers: Vec<Classifier>,
    /// Sum of numerosities over `classifiers`.
    pub micro_pop_size: usize,
    /// Indices of classifiers matching the current instance.
    pub match_set: Vec<usize>,
    /// Subset of `match_set` advocating the current target.
    pub correct_set: Vec<usize>,
    pub covering_count: usize,
    pub crossover_count: usize,
    pub mutation_count: usize,
    pub subsumption_count: usize,
    pub deletion_count: usize,
}

impl Population {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the match set for a training instance, covering on demand.
    ///
    /// For a discrete task the match set must contain at least one advocate
    /// of the instance target; for a continuous task it must be non-empty.
    /// Until that holds, new covering rules are synthesized and inserted,
    /// each followed by a deletion pass when the population overflows.
    pub fn make_match_set<R: Rng>(
        &mut self,
        state: &[f64],
        target: f64,
        iteration: usize,
        config: &ElcsConfig,
        schema: &DataSchema,
        rng: &mut R,
    ) {
        for (index, classifier) in self.classifiers.iter().enumerate() {
            if classifier.matches(state, config) {
                self.match_set.push(index);
            }
        }
        loop {
            let satisfied = match &schema.phenotype {
                PhenotypeInfo::Discrete { .. } => self.match_set.iter().any(|&index| {
                    matches!(self.classifiers[index].phenotype, Phenotype::Class(class) if class == target)
                }),
                PhenotypeInfo::Continuous { .. } => !self.match_set.is_empty(),
            };
            if satisfied {
                break;
            }
            let covered = Classifier::new_covering(
                state,
                target,
                iteration,
                self.match_set.len(),
                config,
                schema,
                rng,
            );
            log::debug!("### covering event at iteration {}: {}", iteration, covered);
            self.add_classifier(covered, true);
            self.match_set.push(self.classifiers.len() - 1);
            self.covering_count += 1;
            if self.micro_pop_size > config.max_population_size {
                self.deletion(config, rng);
            }
        }
    }

    /// Match-set construction for inference: no covering, no mutation of any
    /// classifier statistics.
    pub fn make_eval_match_set(&mut self, state: &[f64], config: &ElcsConfig) {
        for (index, classifier) in self.classifiers.iter().enumerate() {
            if classifier.matches(state, config) {
                self.match_set.push(index);
            }
        }
    }

    pub fn make_correct_set(&mut self, target: f64) {
        for &index in &self.match_set {
            let advocates = match &self.classifiers[index].phenotype {
                Phenotype::Class(class) => *class == target,
                Phenotype::Interval { low, high } => *low <= target && target <= *high,
            };
            if advocates {
                self.correct_set.push(index);
            }
        }
    }

    /// Updates experience, match-set size estimate, accuracy and fitness of
    /// every match-set member.
    pub fn update_sets(&mut self, config: &ElcsConfig) {
        let match_set_size = self.match_set.len();
        for position in 0..match_set_size {
            let index = self.match_set[position];
            let in_correct_set = self.correct_set.contains(&index);
            self.classifiers[index].update_stats(match_set_size, in_correct_set, config);
        }
    }

    /// Lets the most general subsumption-capable member of the correct set
    /// absorb every other member it subsumes. The microclassifier count is
    /// unchanged; absorbed numerosity moves to the subsumer.
    pub fn do_correct_set_subsumption(&mut self, config: &ElcsConfig) {
        let mut subsumer: Option<usize> = None;
        for &index in &self.correct_set {
            let classifier = &self.classifiers[index];
            if classifier.is_subsumer(config) {
                match subsumer {
                    None => subsumer = Some(index),
                    Some(current) if classifier.is_more_general(&self.classifiers[current]) => {
                        subsumer = Some(index)
                    }
                    _ => {}
                }
            }
        }
        let Some(mut subsumer_index) = subsumer else {
            return;
        };

        let mut position = 0;
        while position < self.correct_set.len() {
            let index = self.correct_set[position];
            if index != subsumer_index
                && self.classifiers[subsumer_index].is_more_general(&self.classifiers[index])
                && self.classifiers[subsumer_index].phenotype_subsumes(&self.classifiers[index])
            {
                log::debug!(
                    "### correct set subsumption: [{}] absorbs [{}]",
                    self.classifiers[subsumer_index],
                    self.classifiers[index]
                );
                self.classifiers[subsumer_index].numerosity += self.classifiers[index].numerosity;
                self.subsumption_count += 1;
                self.remove_macro_classifier(index);
                if index < subsumer_index {
                    subsumer_index -= 1;
                }
                // the removed entry also left the correct set, stay in place
            } else {
                position += 1;
            }
        }
    }

    /// One genetic algorithm invocation on the correct set.
    pub fn run_ga<R: Rng>(
        &mut self,
        iteration: usize,
        state: &[f64],
        target: f64,
        config: &ElcsConfig,
        schema: &DataSchema,
        rng: &mut R,
    ) {
        if self.correct_set.is_empty() {
            return;
        }
        if self.average_time_since_ga(iteration) <= config.theta_ga {
            return;
        }
        for &index in &self.correct_set {
            self.classifiers[index].time_stamp_ga = iteration;
        }
        log::trace!("### genetic algorithm at iteration {}", iteration);

        let first_parent = self.select_parent(config, rng);
        let second_parent = self.select_parent(config, rng);
        let mut first_child =
            Classifier::new_copy(&self.classifiers[first_parent], iteration, config);
        let mut second_child =
            Classifier::new_copy(&self.classifiers[second_parent], iteration, config);

        if first_parent != second_parent && rng.gen::<f64>() < config.chi {
            let crossed = first_child.uniform_crossover(&mut second_child, rng);
            if crossed {
                self.crossover_count += 1;
                let mean_accuracy = (first_child.accuracy + second_child.accuracy) / 2.0;
                let mean_fitness = (first_child.fitness + second_child.fitness) / 2.0;
                first_child.accuracy = mean_accuracy;
                second_child.accuracy = mean_accuracy;
                first_child.fitness = mean_fitness;
                second_child.fitness = mean_fitness;
            }
        }
        if first_child.mutate(state, target, config, schema, rng) {
            self.mutation_count += 1;
        }
        if second_child.mutate(state, target, config, schema, rng) {
            self.mutation_count += 1;
        }

        self.insert_offspring(first_child, first_parent, second_parent, config);
        self.insert_offspring(second_child, first_parent, second_parent, config);
        self.deletion(config, rng);
    }

    /// Numerosity-weighted mean of `iteration - time_stamp_ga` over the
    /// correct set.
    fn average_time_since_ga(&self, iteration: usize) -> f64 {
        let mut weighted_age = 0.0;
        let mut weight = 0.0;
        for &index in &self.correct_set {
            let classifier = &self.classifiers[index];
            weighted_age +=
                (iteration - classifier.time_stamp_ga) as f64 * classifier.numerosity as f64;
            weight += classifier.numerosity as f64;
        }
        weighted_age / weight
    }

    fn select_parent<R: Rng>(&self, config: &ElcsConfig, rng: &mut R) -> usize {
        match config.selection_method {
            SelectionMethod::Tournament => self.select_parent_tournament(config, rng),
            SelectionMethod::Roulette => self.select_parent_roulette(rng),
        }
    }

    /// Tournament over `ceil(theta_sel * correct-set numerosity)` distinct
    /// microclassifiers; the one with the greatest fitness wins.
    fn select_parent_tournament<R: Rng>(&self, config: &ElcsConfig, rng: &mut R) -> usize {
        let mut pool: Vec<usize> = Vec::new();
        for &index in &self.correct_set {
            for _ in 0..self.classifiers[index].numerosity {
                pool.push(index);
            }
        }
        let tournament_size = ((config.theta_sel * pool.len() as f64).ceil() as usize).max(1);
        *pool
            .choose_multiple(rng, tournament_size)
            .max_by(|&&a, &&b| {
                self.classifiers[a]
                    .fitness
                    .total_cmp(&self.classifiers[b].fitness)
            })
            .unwrap()
    }

    /// Fitness-proportionate pick over the macro members of the correct set.
    fn select_parent_roulette<R: Rng>(&self, rng: &mut R) -> usize {
        let weights: Vec<f64> = self
            .correct_set
            .iter()
            .map(|&index| self.classifiers[index].fitness)
            .collect();
        match WeightedIndex::new(&weights) {
            Ok(distribution) => self.correct_set[distribution.sample(rng)],
            // all-zero fitness degenerates to a uniform pick
            Err(_) => self.correct_set[rng.gen_range(0..self.correct_set.len())],
        }
    }

    fn insert_offspring(
        &mut self,
        child: Classifier,
        first_parent: usize,
        second_parent: usize,
        config: &ElcsConfig,
    ) {
        if config.do_ga_subsumption {
            if self.classifiers[first_parent].subsumes(&child, config) {
                self.micro_pop_size += 1;
                self.classifiers[first_parent].numerosity += 1;
                self.subsumption_count += 1;
                return;
            }
            if self.classifiers[second_parent].subsumes(&child, config) {
                self.micro_pop_size += 1;
                self.classifiers[second_parent].numerosity += 1;
                self.subsumption_count += 1;
                return;
            }
        }
        self.add_classifier(child, false);
    }

    /// Inserts a classifier, folding structural duplicates into numerosity.
    /// Covering rules skip the duplicate scan: a rule synthesized because no
    /// advocate existed cannot already be present.
    pub fn add_classifier(&mut self, classifier: Classifier, covering: bool) {
        if !covering {
            if let Some(position) = self
                .classifiers
                .iter()
                .position(|existing| existing.same_rule(&classifier))
            {
                self.classifiers[position].numerosity += 1;
                self.micro_pop_size += 1;
                return;
            }
        }
        self.classifiers.push(classifier);
        self.micro_pop_size += 1;
    }

    /// Removes microclassifiers by deletion-vote roulette until the
    /// population fits the configured bound.
    pub fn deletion<R: Rng>(&mut self, config: &ElcsConfig, rng: &mut R) {
        while self.micro_pop_size > config.max_population_size {
            self.delete_one_microclassifier(config, rng);
        }
    }

    fn delete_one_microclassifier<R: Rng>(&mut self, config: &ElcsConfig, rng: &mut R) {
        let mean_fitness = self
            .classifiers
            .iter()
            .map(|classifier| classifier.fitness * classifier.numerosity as f64)
            .sum::<f64>()
            / self.micro_pop_size as f64;
        for classifier in &mut self.classifiers {
            classifier.deletion_vote = classifier.compute_deletion_vote(mean_fitness, config);
        }
        let votes: Vec<f64> = self
            .classifiers
            .iter()
            .map(|classifier| classifier.deletion_vote)
            .collect();
        let index = match WeightedIndex::new(&votes) {
            Ok(distribution) => distribution.sample(rng),
            // all-zero votes degenerate to a uniform pick
            Err(_) => rng.gen_range(0..self.classifiers.len()),
        };
        self.classifiers[index].numerosity -= 1;
        self.micro_pop_size -= 1;
        self.deletion_count += 1;
        if self.classifiers[index].numerosity == 0 {
            self.remove_macro_classifier(index);
        }
    }

    /// Removes a macroclassifier and repairs both transient index sets in the
    /// same step.
    fn remove_macro_classifier(&mut self, index: usize) {
        self.classifiers.remove(index);
        repair_transient_set(&mut self.match_set, index);
        repair_transient_set(&mut self.correct_set, index);
    }

    pub fn clear_sets(&mut self) {
        self.match_set.clear();
        self.correct_set.clear();
    }

    /// Numerosity-weighted mean fraction of wildcard attributes.
    pub fn average_generality(&self, schema: &DataSchema) -> f64 {
        if self.micro_pop_size == 0 {
            return 0.0;
        }
        let weighted: f64 = self
            .classifiers
            .iter()
            .map(|classifier| {
                classifier.generality(schema.num_attributes) * classifier.numerosity as f64
            })
            .sum();
        weighted / self.micro_pop_size as f64
    }

    /// Per attribute, the summed numerosity of rules specifying it.
    pub fn attribute_specificity_list(&self, schema: &DataSchema) -> Vec<usize> {
        let mut specificity = vec![0; schema.num_attributes];
        for classifier in &self.classifiers {
            for &attribute in &classifier.specified_attributes {
                specificity[attribute] += classifier.numerosity;
            }
        }
        specificity
    }

    /// Per attribute, the summed accuracy-weighted numerosity of rules
    /// specifying it.
    pub fn attribute_accuracy_list(&self, schema: &DataSchema) -> Vec<f64> {
        let mut accuracy = vec![0.0; schema.num_attributes];
        for classifier in &self.classifiers {
            for &attribute in &classifier.specified_attributes {
                accuracy[attribute] += classifier.accuracy * classifier.numerosity as f64;
            }
        }
        accuracy
    }
}

fn repair_transient_set(set: &mut Vec<usize>, removed: usize) {
    set.retain(|&index| index != removed);
    for index in set.iter_mut() {
        if *index > removed {
            *index -= 1;
        }
    }
}

impl fmt::Display for Population {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "population:")?;
        writeln!(f, "  macro size: {}", self.classifiers.len())?;
        writeln!(f, "  micro size: {}", self.micro_pop_size)?;
        writeln!(
            f,
            "  fitness mean: {:.3}, stddev: {:.3}",
            stats::mean(self.classifiers.iter().map(|classifier| classifier.fitness)),
            stats::stddev(self.classifiers.iter().map(|classifier| classifier.fitness)),
        )?;
        writeln!(
            f,
            "  accuracy mean: {:.3}",
            stats::mean(self.classifiers.iter().map(|classifier| classifier.accuracy)),
        )?;
        writeln!(
            f,
            "  events: {} covering, {} crossover, {} mutation, {} subsumption, {} deletion",
            self.covering_count,
            self.crossover_count,
            self.mutation_count,
            self.subsumption_count,
            self.deletion_count
        )
    }
}
