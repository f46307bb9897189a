//! Benchmark adapter around the sampling driver

use std::time::Instant;

use anyhow::Context;
use mcvec_core::prelude::*;
use tracing::debug;

use crate::{measure_time, Benchmark, BenchmarkResult};

type BoxedDriver = Driver<UniformSource, Box<dyn CycleCounter>>;

/// One loop variant under one configuration.
///
/// `warmup` covers initialization and equilibration; `run` covers the timed
/// measurement and the report.
pub struct SamplingBenchmark {
    name: String,
    config: SamplerConfig,
    driver: Option<BoxedDriver>,
}

impl SamplingBenchmark {
    pub fn new(config: SamplerConfig) -> Self {
        Self {
            name: config.variant.name().to_string(),
            config,
            driver: None,
        }
    }

    /// Same configuration with a different variant
    pub fn for_variant(config: &SamplerConfig, variant: Variant) -> Self {
        Self::new(SamplerConfig {
            variant,
            ..config.clone()
        })
    }

    fn build_driver(&self) -> anyhow::Result<BoxedDriver> {
        let rng = UniformSource::from_seed_option(self.config.seed);
        Driver::new(self.config.clone(), rng, self.config.counter.build())
            .with_context(|| format!("Invalid configuration for {}", self.name))
    }
}

impl Benchmark for SamplingBenchmark {
    fn name(&self) -> &str {
        &self.name
    }

    fn warmup(&mut self) -> anyhow::Result<()> {
        let mut driver = self.build_driver()?;
        let (elapsed, outcome) = measure_time(|| -> anyhow::Result<()> {
            driver.initialize()?;
            driver.equilibrate()?;
            Ok(())
        });
        outcome.with_context(|| format!("Equilibration failed for {}", self.name))?;
        debug!("{} equilibrated in {:?}", self.name, elapsed);
        self.driver = Some(driver);
        Ok(())
    }

    fn run(&mut self) -> anyhow::Result<BenchmarkResult> {
        if self.driver.is_none() {
            self.warmup()?;
        }
        let mut driver = self
            .driver
            .take()
            .context("Sampling driver missing after warmup")?;

        // laps are taken from the driver's sweep hook, inside the timed region
        let mut laps = Vec::with_capacity(self.config.sample_sweeps as usize);
        let (total_time, measurement) = measure_time(|| {
            let mut lap_start = Instant::now();
            driver.measure_observed(|_| {
                let now = Instant::now();
                laps.push(now - lap_start);
                lap_start = now;
            })
        });
        let measurement = measurement.with_context(|| format!("Measurement failed for {}", self.name))?;
        let report = driver.report()?;

        let mut result = BenchmarkResult::from_sweep_times(&self.name, &laps, total_time)?;
        let config = driver.config();
        result.throughput = Some(measurement.samples as f64 / total_time.as_secs_f64().max(f64::MIN_POSITIVE));
        result.metadata = serde_json::json!({
            "variant": config.variant,
            "population": config.population,
            "warmup_sweeps": config.warmup_sweeps,
            "sample_sweeps": config.sample_sweeps,
            "seed": config.seed,
            "counter": config.counter,
            "report": report,
        });
        debug!(
            "{}: {} sweeps, min {:?}, max {:?}",
            self.name, result.iterations, result.min_time, result.max_time
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcvec_core::CounterKind;

    fn small_config() -> SamplerConfig {
        SamplerConfig {
            population: 32,
            warmup_sweeps: 4,
            sample_sweeps: 8,
            seed: Some(1),
            counter: CounterKind::Monotonic,
            ..Default::default()
        }
    }

    #[test]
    fn test_sampling_benchmark_reports_samples() {
        let mut bench = SamplingBenchmark::new(small_config());
        bench.warmup().unwrap();
        let result = bench.run().unwrap();
        assert_eq!(result.name, "population");
        assert_eq!(result.iterations, 8);
        assert_eq!(result.metadata["report"]["samples"], 32 * 8);
        assert!(result.cycles_per_sample().is_some());
    }

    #[test]
    fn test_sweep_times_have_spread() {
        let config = SamplerConfig {
            population: 256,
            sample_sweeps: 200,
            ..small_config()
        };
        for &variant in Variant::all() {
            let result = SamplingBenchmark::for_variant(&config, variant).run().unwrap();
            assert_eq!(result.iterations, 200);
            assert!(result.min_time <= result.mean_time, "{}", variant);
            assert!(result.mean_time <= result.max_time, "{}", variant);
            assert!(result.min_time < result.max_time, "{}: no spread measured", variant);
            assert!(result.stddev.is_some_and(|s| s > 0.0), "{}", variant);
            assert!(result.max_time <= result.total_time);
        }
    }

    #[test]
    fn test_run_without_warmup_equilibrates_first() {
        let mut bench = SamplingBenchmark::for_variant(&small_config(), Variant::Predrawn);
        let result = bench.run().unwrap();
        assert_eq!(result.name, "predrawn");
        assert_eq!(result.metadata["variant"], "predrawn");
    }

    #[test]
    fn test_invalid_config_surfaces_error() {
        let config = SamplerConfig {
            population: 0,
            ..small_config()
        };
        let mut bench = SamplingBenchmark::new(config);
        assert!(bench.warmup().is_err());
    }
}
