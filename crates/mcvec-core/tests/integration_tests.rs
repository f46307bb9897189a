//! End-to-end runs of the sampling driver

use mcvec_core::cycles::MonotonicCounter;
use mcvec_core::kernel::kernel;
use mcvec_core::prelude::*;
use mcvec_core::ReplaySource;

fn config(variant: Variant, seed: u64) -> SamplerConfig {
    SamplerConfig {
        population: 1024,
        warmup_sweeps: 300,
        sample_sweeps: 800,
        seed: Some(seed),
        variant,
        ..Default::default()
    }
}

fn run(config: SamplerConfig) -> Report {
    let rng = UniformSource::from_seed_option(config.seed);
    let mut driver = Driver::new(config, rng, MonotonicCounter::new()).unwrap();
    driver.run().unwrap()
}

#[test]
fn test_estimate_converges_to_first_moment() {
    for seed in [1, 2, 3] {
        let report = run(config(Variant::Population, seed));
        assert!(
            (report.estimate - 1.0).abs() < 0.05,
            "seed {}: estimate {}",
            seed,
            report.estimate
        );
        assert_eq!(report.samples, 1024 * 800);
    }
}

#[test]
fn test_all_variants_converge() {
    for &variant in Variant::all() {
        let report = run(config(variant, 17));
        assert!(
            (report.estimate - 1.0).abs() < 0.05,
            "{}: estimate {}",
            variant,
            report.estimate
        );
        assert!(report.acceptance_rate > 0.0 && report.acceptance_rate < 1.0);
    }
}

#[test]
fn test_seeded_runs_reproduce_estimate() {
    let a = run(config(Variant::Population, 2024));
    let b = run(config(Variant::Population, 2024));
    assert_eq!(a.estimate.to_bits(), b.estimate.to_bits());
    assert_eq!(a.samples, b.samples);
}

#[test]
fn test_measurement_isolated_from_warmup() {
    let config = SamplerConfig {
        population: 128,
        warmup_sweeps: 10,
        sample_sweeps: 25,
        ..Default::default()
    };
    let mut driver = Driver::new(config, ReplaySource::new(vec![0.4, 0.7, 0.1, 0.2]), MonotonicCounter::new()).unwrap();
    driver.initialize().unwrap();
    driver.equilibrate().unwrap();

    let mut calls = 0u64;
    let measurement = driver
        .measure_with(|r, x, p| {
            calls += 1;
            kernel(r, x, p)
        })
        .unwrap();

    assert_eq!(calls, 128 * 25);
    assert_eq!(measurement.samples, 128 * 25);
    assert!(driver.population().unwrap().is_consistent());
}

#[test]
fn test_replayed_midpoint_estimate() {
    // every proposal is 11.5 and is always accepted
    let config = SamplerConfig {
        population: 16,
        warmup_sweeps: 2,
        sample_sweeps: 3,
        ..Default::default()
    };
    let mut driver = Driver::new(config, ReplaySource::new(vec![0.5, 0.0]), MonotonicCounter::new()).unwrap();
    let report = driver.run().unwrap();
    assert_eq!(report.estimate, 11.5);
    assert_eq!(report.acceptance_rate, 1.0);
}
