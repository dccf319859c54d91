mod support;
use support::*;

fn assert_population_invariants(model: &Elcs) {
    let population = model.population().unwrap();
    let micro_sum: usize = population
        .classifiers
        .iter()
        .map(|classifier| classifier.numerosity)
        .sum();
    assert_eq!(population.micro_pop_size, micro_sum);
    for classifier in &population.classifiers {
        assert!((0.0..=1.0).contains(&classifier.accuracy));
        assert!((0.0..=1.0).contains(&classifier.fitness));
        assert!(classifier.numerosity >= 1);
        assert!(classifier.correct_count <= classifier.match_count);
    }
    for (first_index, first) in population.classifiers.iter().enumerate() {
        for second in population.classifiers.iter().skip(first_index + 1) {
            assert!(!first.same_rule(second), "structural duplicate in population");
        }
    }
}

#[test]
fn builder_rejects_out_of_range_hyperparameters() {
    assert!(matches!(
        Elcs::builder().with_p_spec(1.5).build(),
        Err(ElcsError::InvalidHyperparameter(_))
    ));
    assert!(matches!(
        Elcs::builder().with_chi(-0.1).build(),
        Err(ElcsError::InvalidHyperparameter(_))
    ));
    assert!(matches!(
        Elcs::builder().with_beta(0.0).build(),
        Err(ElcsError::InvalidHyperparameter(_))
    ));
    assert!(matches!(
        Elcs::builder().with_theta_ga(-1.0).build(),
        Err(ElcsError::InvalidHyperparameter(_))
    ));
    assert!(matches!(
        Elcs::builder().with_max_population_size(0).build(),
        Err(ElcsError::InvalidHyperparameter(_))
    ));
    assert!(Elcs::builder().build().is_ok());
}

#[test]
fn listed_attribute_out_of_range_fails_at_fit() {
    let (x, y) = xor_data();
    let mut model = Elcs::builder()
        .with_learning_iterations(10)
        .with_discrete_attribute_limit(DiscreteAttributeLimit::ListedDiscrete)
        .with_specified_attributes(vec![9])
        .with_random_seed(0)
        .build()
        .unwrap();

    assert!(matches!(
        model.fit(&x, &y),
        Err(ElcsError::InvalidHyperparameter(_))
    ));
}

#[test]
fn fitting_twice_is_an_illegal_state() {
    let (x, y) = xor_data();
    let mut model = Elcs::builder()
        .with_learning_iterations(10)
        .with_random_seed(0)
        .build()
        .unwrap();
    model.fit(&x, &y).unwrap();

    assert!(matches!(model.fit(&x, &y), Err(ElcsError::IllegalState(_))));
}

#[test]
fn inference_before_fit_is_an_illegal_state() {
    let (x, _) = xor_data();
    let mut model = Elcs::builder().build().unwrap();

    assert!(matches!(model.predict(&x), Err(ElcsError::IllegalState(_))));
    assert!(matches!(
        model.predict_proba(&x),
        Err(ElcsError::IllegalState(_))
    ));
    assert!(matches!(
        model.training_instance_coverage(),
        Err(ElcsError::IllegalState(_))
    ));
    assert!(matches!(
        model.attribute_specificity_list(),
        Err(ElcsError::IllegalState(_))
    ));
}

#[test]
fn malformed_inputs_are_rejected() {
    let mut model = Elcs::builder()
        .with_learning_iterations(10)
        .with_random_seed(0)
        .build()
        .unwrap();

    let infinite = vec![vec![f64::INFINITY, 0.0]];
    assert!(matches!(
        model.fit(&infinite, &[0.0]),
        Err(ElcsError::InvalidInput(_))
    ));

    let ragged = vec![vec![0.0, 1.0], vec![0.0]];
    assert!(matches!(
        model.fit(&ragged, &[0.0, 1.0]),
        Err(ElcsError::InvalidInput(_))
    ));

    let (x, _) = xor_data();
    assert!(matches!(
        model.fit(&x, &[0.0, 1.0, f64::NAN, 0.0]),
        Err(ElcsError::InvalidInput(_))
    ));
    assert!(matches!(
        model.fit(&x, &[0.0, 1.0]),
        Err(ElcsError::InvalidInput(_))
    ));

    // a valid fit, then a test row of the wrong width
    let (x, y) = xor_data();
    model.fit(&x, &y).unwrap();
    assert!(matches!(
        model.predict(&[vec![0.0]]),
        Err(ElcsError::InvalidInput(_))
    ));
}

#[test]
fn learns_xor_exactly() {
    let (x, y) = xor_data();
    let mut model = Elcs::builder()
        .with_learning_iterations(5000)
        .with_max_population_size(200)
        .with_random_seed(1)
        .build()
        .unwrap();
    model.fit(&x, &y).unwrap();

    assert_eq!(model.predict(&x).unwrap(), y);
    assert_relative_eq!(model.score(&x, &y).unwrap(), 1.0);
    assert_relative_eq!(model.training_score().unwrap(), 1.0);
    assert_relative_eq!(model.training_instance_coverage().unwrap(), 1.0);
    assert_population_invariants(&model);
}

#[test]
fn xor_probabilities_follow_the_votes() {
    let (x, y) = xor_data();
    let mut model = Elcs::builder()
        .with_learning_iterations(5000)
        .with_max_population_size(200)
        .with_random_seed(1)
        .build()
        .unwrap();
    model.fit(&x, &y).unwrap();

    let probabilities = model.predict_proba(&x).unwrap();
    for (row, &target) in probabilities.iter().zip(&y) {
        assert_relative_eq!(row.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
        // classes are [0, 1], so the target class index is the target itself
        assert!(row[target as usize] > 0.5);
    }
}

#[test]
fn majority_of_three_discovers_a_two_bit_rule() {
    let (x, y) = majority_data();
    let mut model = Elcs::builder()
        .with_learning_iterations(3000)
        .with_max_population_size(400)
        .with_random_seed(3)
        .build()
        .unwrap();
    model.fit(&x, &y).unwrap();

    let population = model.population().unwrap();
    let found = population.classifiers.iter().any(|classifier| {
        classifier.phenotype == Phenotype::Class(1.0)
            && classifier.specified_attributes.len() == 2
            && classifier
                .condition
                .iter()
                .all(|element| *element == ConditionElement::Value(1.0))
    });
    assert!(found, "no two-bit majority rule advocating class 1");
    assert_population_invariants(&model);
}

#[test]
fn approximates_a_single_feature_linear_target() {
    let x: Vec<Vec<f64>> = vec![
        vec![0.0],
        vec![0.25],
        vec![0.5],
        vec![0.75],
        vec![1.0],
    ];
    let y: Vec<f64> = x.iter().map(|row| row[0]).collect();
    let mut model = Elcs::builder()
        .with_learning_iterations(5000)
        // force the five-valued attribute and target to be continuous
        .with_discrete_attribute_limit(DiscreteAttributeLimit::UniqueValueLimit(3))
        .with_random_seed(7)
        .build()
        .unwrap();
    model.fit(&x, &y).unwrap();

    assert!(!model.schema().unwrap().is_discrete_phenotype());
    let predictions = model.predict(&x).unwrap();
    for (prediction, target) in predictions.iter().zip(&y) {
        assert!(
            (prediction - target).abs() <= 0.15,
            "prediction {} too far from target {}",
            prediction,
            target
        );
    }
    assert_population_invariants(&model);
}

#[test]
fn covering_handles_missing_values_when_matching_for_missingness() {
    let x = vec![
        vec![0.0, f64::NAN],
        vec![1.0, 0.0],
        vec![f64::NAN, 1.0],
    ];
    let y = vec![0.0, 1.0, 1.0];
    let mut model = Elcs::builder()
        .with_learning_iterations(3)
        .with_p_spec(1.0)
        .with_match_for_missingness(true)
        .with_random_seed(0)
        .build()
        .unwrap();
    model.fit(&x, &y).unwrap();

    let population = model.population().unwrap();
    assert!(population.classifiers.len() >= 3);
    assert!(population.covering_count >= 3);
    assert!(model.predict(&x).is_ok());
    assert_population_invariants(&model);
}

#[test]
fn deletion_pressure_keeps_the_population_tiny() {
    let (x, y) = xor_data();
    let mut model = Elcs::builder()
        .with_learning_iterations(500)
        .with_max_population_size(10)
        .with_random_seed(5)
        .build()
        .unwrap();
    model.fit(&x, &y).unwrap();

    let population = model.population().unwrap();
    assert!(population.micro_pop_size <= 10);
    assert!(population.classifiers.len() <= 10);
    assert_population_invariants(&model);
}

#[test]
fn a_single_slot_population_still_trains() {
    let (x, y) = xor_data();
    let mut model = Elcs::builder()
        .with_learning_iterations(200)
        .with_max_population_size(1)
        .with_random_seed(9)
        .build()
        .unwrap();
    model.fit(&x, &y).unwrap();

    assert_eq!(model.population().unwrap().micro_pop_size, 1);
    assert_population_invariants(&model);
}

#[test]
fn training_is_deterministic_for_a_fixed_seed() {
    let (x, y) = majority_data();
    let mut populations = Vec::new();
    for _ in 0..2 {
        let mut model = Elcs::builder()
            .with_learning_iterations(500)
            .with_max_population_size(100)
            .with_random_seed(42)
            .build()
            .unwrap();
        model.fit(&x, &y).unwrap();
        let mut classifiers = model.population().unwrap().classifiers.clone();
        classifiers.sort_by(|a, b| {
            a.init_time_stamp
                .cmp(&b.init_time_stamp)
                .then(a.specified_attributes.cmp(&b.specified_attributes))
        });
        populations.push(classifiers);
    }

    let (first, second) = (&populations[0], &populations[1]);
    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second) {
        assert!(a.same_rule(b));
        assert_eq!(a.fitness.to_bits(), b.fitness.to_bits());
        assert_eq!(a.accuracy.to_bits(), b.accuracy.to_bits());
        assert_eq!(a.numerosity, b.numerosity);
        assert_eq!(a.match_count, b.match_count);
        assert_eq!(a.correct_count, b.correct_count);
        assert_eq!(a.time_stamp_ga, b.time_stamp_ga);
        assert_eq!(a.init_time_stamp, b.init_time_stamp);
    }
}

#[test]
fn no_crossover_and_no_mutation_still_learn_through_covering() {
    let (x, y) = xor_data();
    for (chi, upsilon) in [(0.0, 0.04), (0.8, 0.0)] {
        let mut model = Elcs::builder()
            .with_learning_iterations(1000)
            .with_max_population_size(100)
            .with_chi(chi)
            .with_upsilon(upsilon)
            .with_random_seed(11)
            .build()
            .unwrap();
        model.fit(&x, &y).unwrap();
        assert_population_invariants(&model);
        // every instance keeps an advocate thanks to covering
        assert_relative_eq!(model.training_instance_coverage().unwrap(), 1.0);
    }
}

#[test]
fn correct_set_subsumption_run_stays_consistent() {
    let (x, y) = majority_data();
    let mut model = Elcs::builder()
        .with_learning_iterations(2000)
        .with_max_population_size(200)
        .with_do_correct_set_subsumption(true)
        .with_random_seed(13)
        .build()
        .unwrap();
    model.fit(&x, &y).unwrap();

    assert_population_invariants(&model);
}

#[test]
fn roulette_selection_also_converges_on_xor() {
    let (x, y) = xor_data();
    let mut model = Elcs::builder()
        .with_learning_iterations(5000)
        .with_max_population_size(200)
        .with_selection_method(SelectionMethod::Roulette)
        .with_random_seed(1)
        .build()
        .unwrap();
    model.fit(&x, &y).unwrap();

    assert!(model.score(&x, &y).unwrap() >= 0.75);
    assert_population_invariants(&model);
}

#[test]
fn rolling_accuracy_trends_upward_on_clean_data() {
    let (x, y) = xor_data();
    let mut model = Elcs::builder()
        .with_learning_iterations(5000)
        .with_max_population_size(200)
        .with_track_accuracy_while_fit(true)
        .with_random_seed(1)
        .build()
        .unwrap();
    model.fit(&x, &y).unwrap();

    let rolling = model.rolling_accuracy();
    assert_eq!(rolling.len(), 5000);
    let early: f64 = rolling[..100].iter().sum::<f64>() / 100.0;
    let late: f64 = rolling[4900..].iter().sum::<f64>() / 100.0;
    assert!(
        late > early,
        "rolling accuracy did not improve: early {} late {}",
        early,
        late
    );
    assert!(late > 0.9);
}

#[test]
fn unmatched_rows_predict_the_sentinel() {
    // one instance, fully specified rules only, nothing matches elsewhere
    let x = vec![vec![0.0, 0.0]];
    let y = vec![0.0];
    let mut model = Elcs::builder()
        .with_learning_iterations(20)
        .with_p_spec(1.0)
        .with_upsilon(0.0)
        .with_chi(0.0)
        .with_random_seed(0)
        .build()
        .unwrap();
    model.fit(&x, &y).unwrap();

    let predictions = model.predict(&[vec![5.0, 5.0]]).unwrap();
    assert!(predictions[0].is_nan());
    // a single class means a degenerate but well-formed distribution
    assert_eq!(model.predict_proba(&[vec![5.0, 5.0]]).unwrap()[0], vec![1.0]);
}

#[test]
fn continuous_task_refuses_probabilities_and_scores() {
    let x: Vec<Vec<f64>> = (0..12).map(|row| vec![row as f64]).collect();
    let y: Vec<f64> = (0..12).map(|row| row as f64 / 11.0).collect();
    let mut model = Elcs::builder()
        .with_learning_iterations(50)
        .with_discrete_attribute_limit(DiscreteAttributeLimit::UniqueValueLimit(3))
        .with_random_seed(0)
        .build()
        .unwrap();
    model.fit(&x, &y).unwrap();

    assert!(matches!(
        model.predict_proba(&x),
        Err(ElcsError::IllegalState(_))
    ));
    assert!(matches!(
        model.score(&x, &y),
        Err(ElcsError::IllegalState(_))
    ));
}
