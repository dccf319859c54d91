#[allow(unused_imports)]
pub use approx::assert_relative_eq;
#[allow(unused_imports)]
pub use elcs::prelude::*;
#[allow(unused_imports)]
pub use rand::rngs::SmallRng;
#[allow(unused_imports)]
pub use rand::SeedableRng;

/// A classifier with the given structure and neutral statistics.
#[allow(dead_code)]
pub fn rule(
    specified_attributes: Vec<usize>,
    condition: Vec<ConditionElement>,
    phenotype: Phenotype,
) -> Classifier {
    Classifier {
        specified_attributes,
        condition,
        phenotype,
        fitness: 0.01,
        accuracy: 0.0,
        numerosity: 1,
        ave_match_set_size: 0.0,
        time_stamp_ga: 0,
        init_time_stamp: 0,
        match_count: 0,
        correct_count: 0,
        deletion_vote: 0.0,
    }
}

/// Two binary attributes, two classes.
#[allow(dead_code)]
pub fn binary_schema() -> DataSchema {
    DataSchema {
        num_attributes: 2,
        attributes: vec![AttributeInfo::Discrete, AttributeInfo::Discrete],
        phenotype: PhenotypeInfo::Discrete {
            classes: vec![0.0, 1.0],
        },
    }
}

#[allow(dead_code)]
pub fn xor_data() -> (Vec<Vec<f64>>, Vec<f64>) {
    (
        vec![
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
        ],
        vec![0.0, 1.0, 1.0, 0.0],
    )
}

/// All eight binary triples labelled with their majority bit.
#[allow(dead_code)]
pub fn majority_data() -> (Vec<Vec<f64>>, Vec<f64>) {
    let mut x = Vec::new();
    let mut y = Vec::new();
    for a in 0..2 {
        for b in 0..2 {
            for c in 0..2 {
                x.push(vec![a as f64, b as f64, c as f64]);
                y.push(if a + b + c >= 2 { 1.0 } else { 0.0 });
            }
        }
    }
    (x, y)
}
