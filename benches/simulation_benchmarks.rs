//! Simulation Benchmarks with 95% Confidence Intervals
//!
//! Measures the three hot loops: single-parameter sampling, joint
//! multi-parameter sampling and the model-level Monte Carlo.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use qualisim::prelude::*;

/// Single-parameter simulation at the iteration counts callers use.
fn bench_single_parameter(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_parameter");
    group.sample_size(50);
    group.confidence_level(0.95);

    let param = TestParameter::triangular("moisture", 2.0, 3.0, 4.5).with_acceptance(3.0, 1.0);
    for iterations in [1_000, 10_000, 100_000] {
        group.bench_with_input(
            BenchmarkId::new("triangular", iterations),
            &iterations,
            |b, &iterations| {
                let mut rng = SimRng::new(42);
                b.iter(|| {
                    let result =
                        run_monte_carlo_simulation(&param, iterations, 95.0, &mut rng);
                    black_box(result.map(|r| r.success_probability))
                });
            },
        );
    }

    group.finish();
}

/// Joint simulation, scaling with the number of parameters.
fn bench_multi_parameter(c: &mut Criterion) {
    let mut group = c.benchmark_group("multi_parameter");
    group.sample_size(30);
    group.confidence_level(0.95);

    for n in [2, 5, 10] {
        let params: Vec<TestParameter> = (0..n)
            .map(|i| {
                let mean = 10.0 + f64::from(i);
                TestParameter::normal(format!("p{i}"), mean, 0.5).with_acceptance(mean, 1.0)
            })
            .collect();
        group.bench_with_input(BenchmarkId::new("normal", n), &params, |b, params| {
            let mut rng = SimRng::new(42);
            b.iter(|| {
                let result = run_multi_parameter_simulation(params, 10_000, 95.0, &mut rng);
                black_box(result.map(|r| r.overall.success_probability))
            });
        });
    }

    group.finish();
}

/// Model Monte Carlo over the default grid and presets.
fn bench_model_monte_carlo(c: &mut Criterion) {
    let mut group = c.benchmark_group("model_monte_carlo");
    group.sample_size(20);

    for kind in [ModelKind::Solubility, ModelKind::Microbial] {
        let inputs = kind.default_inputs();
        let variations = kind.default_variations();
        group.bench_function(kind.as_str(), |b| {
            let mut rng = SimRng::new(42);
            b.iter(|| {
                let result = kind.monte_carlo(&inputs, &variations, 1000, &mut rng);
                black_box(result.map(|r| r.aggregated.statistics.mean))
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_single_parameter,
    bench_multi_parameter,
    bench_model_monte_carlo
);
criterion_main!(benches);
