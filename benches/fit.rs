use criterion::*;
use elcs::prelude::*;

pub fn fit_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("fit");

    let x = vec![
        vec![0.0, 0.0],
        vec![0.0, 1.0],
        vec![1.0, 0.0],
        vec![1.0, 1.0],
    ];
    let y = vec![0.0, 1.0, 1.0, 0.0];

    group.bench_function("xor_500_iterations", |b| {
        b.iter(|| {
            let mut model = Elcs::builder()
                .with_learning_iterations(500)
                .with_max_population_size(100)
                .with_random_seed(1)
                .build()
                .unwrap();
            model.fit(black_box(&x), black_box(&y)).unwrap();
            model
        })
    });

    group.bench_function("xor_predict", |b| {
        let mut model = Elcs::builder()
            .with_learning_iterations(500)
            .with_max_population_size(100)
            .with_random_seed(1)
            .build()
            .unwrap();
        model.fit(&x, &y).unwrap();
        b.iter(|| model.predict(black_box(&x)).unwrap())
    });

    group.finish();
}

criterion_group!(benches, fit_benchmark);
criterion_main!(benches);
