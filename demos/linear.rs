use elcs::prelude::*;

fn main() {
    env_logger::init();

    // a noiseless linear target over one continuous attribute
    let x: Vec<Vec<f64>> = (0..=20).map(|step| vec![step as f64 / 20.0]).collect();
    let y: Vec<f64> = x.iter().map(|row| row[0]).collect();

    let mut model = Elcs::builder()
        .with_learning_iterations(5000)
        .with_discrete_attribute_limit(DiscreteAttributeLimit::UniqueValueLimit(5))
        .with_random_seed(7)
        .build()
        .unwrap();

    model.fit(&x, &y).unwrap();

    println!("{}", model.population().unwrap());
    let predictions = model.predict(&x).unwrap();
    for (row, (prediction, target)) in x.iter().zip(predictions.iter().zip(&y)) {
        println!(
            "x = {:.2}  predicted = {:.3}  target = {:.2}",
            row[0], prediction, target
        );
    }
}
