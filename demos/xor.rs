use elcs::prelude::*;

fn main() {
    env_logger::init();

    let x = vec![
        vec![0.0, 0.0],
        vec![0.0, 1.0],
        vec![1.0, 0.0],
        vec![1.0, 1.0],
    ];
    let y = vec![0.0, 1.0, 1.0, 0.0];

    let mut model = Elcs::builder()
        .with_learning_iterations(5000)
        .with_max_population_size(200)
        .with_random_seed(1)
        .build()
        .unwrap();

    model.fit(&x, &y).unwrap();

    println!("{}", model.population().unwrap());
    println!("predictions: {:?}", model.predict(&x).unwrap());
    println!("balanced accuracy: {}", model.score(&x, &y).unwrap());
    println!(
        "instance coverage: {}",
        model.training_instance_coverage().unwrap()
    );

    println!("top rules by numerosity:");
    let mut classifiers = model.population().unwrap().classifiers.clone();
    classifiers.sort_by(|a, b| b.numerosity.cmp(&a.numerosity));
    for classifier in classifiers.iter().take(10) {
        println!("  {}", classifier);
    }
}
