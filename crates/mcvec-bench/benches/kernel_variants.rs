//! Kernel variant benchmarks
//!
//! Times one equilibrated sweep of each loop variant so criterion can show
//! how far the restructured loops get from the scalar kernel.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mcvec_core::kernel::{density, kernel, select_step};
use mcvec_core::variants::{predrawn_sweep, sweep, DrawBuffers};
use mcvec_core::{Population, RandomSource, UniformSource};

const POPULATIONS: [usize; 3] = [1024, 10240, 65536];

fn equilibrated(len: usize, seed: u64) -> (Population, UniformSource) {
    let mut rng = UniformSource::seeded(seed);
    let mut population = Population::initialize(len, &mut rng).expect("population allocation");
    let (positions, weights) = population.split_mut();
    let mut step = |r: &mut UniformSource, x: &mut f64, p: &mut f64| kernel(r, x, p);
    for _ in 0..100 {
        sweep(&mut rng, positions, weights, &mut step);
    }
    (population, rng)
}

/// One sweep of the branchy scalar kernel over the population
fn bench_population_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("population_sweep");

    for &len in &POPULATIONS {
        let (mut population, mut rng) = equilibrated(len, 1);
        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, _| {
            let (positions, weights) = population.split_mut();
            let mut step = |r: &mut UniformSource, x: &mut f64, p: &mut f64| kernel(r, x, p);
            b.iter(|| black_box(sweep(&mut rng, positions, weights, &mut step)));
        });
    }

    group.finish();
}

/// Draw generation and the branch-free pass, timed separately and together
fn bench_predrawn_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("predrawn_sweep");

    for &len in &POPULATIONS {
        let (mut population, mut rng) = equilibrated(len, 2);
        let mut draws = DrawBuffers {
            propose: vec![0.0; len],
            accept: vec![0.0; len],
        };
        group.throughput(Throughput::Elements(len as u64));

        group.bench_with_input(BenchmarkId::new("fill", len), &len, |b, _| {
            b.iter(|| {
                draws.fill(&mut rng);
                black_box(&draws);
            });
        });

        draws.fill(&mut rng);
        group.bench_with_input(BenchmarkId::new("select", len), &len, |b, _| {
            let (positions, weights) = population.split_mut();
            b.iter(|| black_box(predrawn_sweep(positions, weights, &draws)));
        });

        group.bench_with_input(BenchmarkId::new("fill_and_select", len), &len, |b, _| {
            let (positions, weights) = population.split_mut();
            b.iter(|| {
                draws.fill(&mut rng);
                black_box(predrawn_sweep(positions, weights, &draws))
            });
        });
    }

    group.finish();
}

/// Cost of the pieces of a single step
fn bench_step_components(c: &mut Criterion) {
    let mut group = c.benchmark_group("step_components");
    let mut rng = UniformSource::seeded(3);

    group.bench_function("drand", |b| b.iter(|| black_box(rng.drand())));
    group.bench_function("density", |b| b.iter(|| black_box(density(black_box(4.2)))));
    group.bench_function("select_step", |b| {
        b.iter(|| {
            black_box(select_step(
                black_box(1.0),
                black_box(density(1.0)),
                black_box(0.3),
                black_box(0.7),
            ))
        })
    });
    group.bench_function("kernel", |b| {
        let (mut x, mut p) = (1.0, density(1.0));
        b.iter(|| black_box(kernel(&mut rng, &mut x, &mut p)))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_population_sweep,
    bench_predrawn_sweep,
    bench_step_components
);
criterion_main!(benches);
