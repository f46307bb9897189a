//! Benchmark driver: initialize, equilibrate, measure, report
//!
//! Phases run strictly in order. Only the measurement phase is bracketed by
//! counter readings, so the cost of equilibration never shows up in the
//! reported number.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::SamplerConfig;
use crate::cycles::{elapsed, CycleCounter};
use crate::error::{Error, Result};
use crate::kernel::kernel;
use crate::population::{try_alloc, Population};
use crate::random::RandomSource;
use crate::report::{Measurement, Report};
use crate::variants::{
    predrawn_sweep, predrawn_sweep_accumulate, sweep, sweep_accumulate, DrawBuffers, Variant,
};

/// Next phase the driver will run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Init,
    Warmup,
    Measure,
    Report,
    Done,
}

/// Loop shape derived from the configuration and variant.
///
/// A sweep is `passes` passes over `particles`; every variant performs
/// `population` steps per sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout {
    particles: usize,
    passes: usize,
    warmup_sweeps: u64,
    sample_sweeps: u64,
}

impl Layout {
    fn samples(&self) -> u64 {
        self.sample_sweeps * (self.passes * self.particles) as u64
    }
}

/// Owns the generator, the counter and the population for one run.
pub struct Driver<R: RandomSource, C: CycleCounter> {
    config: SamplerConfig,
    layout: Layout,
    rng: R,
    counter: C,
    population: Option<Population>,
    draws: DrawBuffers,
    measurement: Option<Measurement>,
    phase: Phase,
}

impl<R: RandomSource, C: CycleCounter> Driver<R, C> {
    pub fn new(config: SamplerConfig, rng: R, counter: C) -> Result<Self> {
        config.validate()?;
        let layout = match config.variant {
            Variant::Population | Variant::Predrawn => Layout {
                particles: config.population,
                passes: 1,
                warmup_sweeps: u64::from(config.warmup_sweeps),
                sample_sweeps: u64::from(config.sample_sweeps),
            },
            Variant::SingleChain => Layout {
                particles: 1,
                passes: config.population,
                warmup_sweeps: u64::from(config.warmup_sweeps),
                sample_sweeps: u64::from(config.sample_sweeps),
            },
        };

        Ok(Self {
            config,
            layout,
            rng,
            counter,
            population: None,
            draws: DrawBuffers::default(),
            measurement: None,
            phase: Phase::Init,
        })
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn population(&self) -> Option<&Population> {
        self.population.as_ref()
    }

    pub fn measurement(&self) -> Option<&Measurement> {
        self.measurement.as_ref()
    }

    fn enter(&self, expected: Phase) -> Result<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(Error::InvalidPhase {
                expected,
                found: self.phase,
            })
        }
    }

    /// Allocate the population and draw initial positions.
    pub fn initialize(&mut self) -> Result<()> {
        self.enter(Phase::Init)?;
        let particles = self.layout.particles;
        debug!(particles, variant = %self.config.variant, "Allocating population");

        self.population = Some(Population::initialize(particles, &mut self.rng)?);
        if self.config.variant == Variant::Predrawn {
            let mut propose = try_alloc(particles)?;
            let mut accept = try_alloc(particles)?;
            propose.resize(particles, 0.0);
            accept.resize(particles, 0.0);
            self.draws = DrawBuffers { propose, accept };
        }

        self.phase = Phase::Warmup;
        Ok(())
    }

    /// Run the equilibration sweeps. Nothing is recorded.
    pub fn equilibrate(&mut self) -> Result<()> {
        self.enter(Phase::Warmup)?;
        info!(sweeps = self.layout.warmup_sweeps, "Equilibrating population");

        let population = self.population.as_mut().ok_or(Error::InvalidPhase {
            expected: Phase::Init,
            found: self.phase,
        })?;
        let (positions, weights) = population.split_mut();
        let rng = &mut self.rng;

        match self.config.variant {
            Variant::Population | Variant::SingleChain => {
                let mut step = |r: &mut R, x: &mut f64, p: &mut f64| kernel(r, x, p);
                for _ in 0..self.layout.warmup_sweeps {
                    for _ in 0..self.layout.passes {
                        sweep(rng, positions, weights, &mut step);
                    }
                }
            }
            Variant::Predrawn => {
                for _ in 0..self.layout.warmup_sweeps {
                    self.draws.fill(rng);
                    predrawn_sweep(positions, weights, &self.draws);
                }
            }
        }

        self.phase = Phase::Measure;
        Ok(())
    }

    /// Timed sampling with the real kernel.
    pub fn measure(&mut self) -> Result<Measurement> {
        self.measure_observed(|_| {})
    }

    /// Timed sampling that calls `on_sweep` with the sweep index after
    /// every measured sweep.
    ///
    /// The observer runs inside the bracketed region, so anything it does
    /// is charged to the measurement.
    pub fn measure_observed<O>(&mut self, on_sweep: O) -> Result<Measurement>
    where
        O: FnMut(u64),
    {
        match self.config.variant {
            Variant::Population | Variant::SingleChain => {
                self.measure_scalar(|r: &mut R, x: &mut f64, p: &mut f64| kernel(r, x, p), on_sweep)
            }
            Variant::Predrawn => self.measure_predrawn(on_sweep),
        }
    }

    /// Timed sampling with `step` applied in place of the kernel.
    ///
    /// Runs the scalar loop shape of the configured variant and brackets
    /// exactly `sample_sweeps * population` calls to `step`.
    pub fn measure_with<F>(&mut self, step: F) -> Result<Measurement>
    where
        F: FnMut(&mut R, &mut f64, &mut f64) -> bool,
    {
        self.measure_scalar(step, |_| {})
    }

    fn measure_scalar<F, O>(&mut self, mut step: F, mut on_sweep: O) -> Result<Measurement>
    where
        F: FnMut(&mut R, &mut f64, &mut f64) -> bool,
        O: FnMut(u64),
    {
        self.enter(Phase::Measure)?;
        info!(sweeps = self.layout.sample_sweeps, "Sampling and measuring");

        let population = self.population.as_mut().ok_or(Error::InvalidPhase {
            expected: Phase::Init,
            found: self.phase,
        })?;
        let (positions, weights) = population.split_mut();
        let rng = &mut self.rng;

        let mut sum = 0.0;
        let mut accepted = 0;
        let start = self.counter.now();
        for i in 0..self.layout.sample_sweeps {
            for _ in 0..self.layout.passes {
                accepted += sweep_accumulate(rng, positions, weights, &mut step, &mut sum);
            }
            on_sweep(i);
        }
        let end = self.counter.now();

        Ok(self.finish_measurement(sum, accepted, elapsed(start, end)))
    }

    fn measure_predrawn<O: FnMut(u64)>(&mut self, mut on_sweep: O) -> Result<Measurement> {
        self.enter(Phase::Measure)?;
        info!(sweeps = self.layout.sample_sweeps, "Sampling and measuring (predrawn)");

        let population = self.population.as_mut().ok_or(Error::InvalidPhase {
            expected: Phase::Init,
            found: self.phase,
        })?;
        let (positions, weights) = population.split_mut();

        let mut sum = 0.0;
        let mut accepted = 0;
        let start = self.counter.now();
        for i in 0..self.layout.sample_sweeps {
            self.draws.fill(&mut self.rng);
            accepted += predrawn_sweep_accumulate(positions, weights, &self.draws, &mut sum);
            on_sweep(i);
        }
        let end = self.counter.now();

        Ok(self.finish_measurement(sum, accepted, elapsed(start, end)))
    }

    fn finish_measurement(&mut self, sum: f64, accepted: u64, cycles: u64) -> Measurement {
        let measurement = Measurement {
            sum,
            samples: self.layout.samples(),
            cycles,
            accepted,
        };
        debug!(?measurement, "Measurement complete");
        self.measurement = Some(measurement);
        self.phase = Phase::Report;
        measurement
    }

    /// Derive the estimate and the cost per sample.
    pub fn report(&mut self) -> Result<Report> {
        self.enter(Phase::Report)?;
        let measurement = self.measurement.ok_or(Error::InvalidPhase {
            expected: Phase::Measure,
            found: self.phase,
        })?;
        let report = Report::from_measurement(&measurement, self.counter.unit());
        info!(
            estimate = report.estimate,
            cycles_per_sample = report.cycles_per_sample,
            acceptance_rate = report.acceptance_rate,
            "Run complete"
        );
        self.phase = Phase::Done;
        Ok(report)
    }

    /// All phases in order.
    pub fn run(&mut self) -> Result<Report> {
        self.initialize()?;
        self.equilibrate()?;
        self.measure()?;
        self.report()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cycles::MonotonicCounter;
    use crate::random::{ReplaySource, UniformSource};

    /// Counter that advances by a fixed step per reading
    struct StepCounter {
        ticks: u64,
        step: u64,
    }

    impl CycleCounter for StepCounter {
        fn now(&mut self) -> u64 {
            self.ticks += self.step;
            self.ticks
        }

        fn unit(&self) -> &'static str {
            "ticks"
        }
    }

    fn small_config(variant: Variant) -> SamplerConfig {
        SamplerConfig {
            population: 64,
            warmup_sweeps: 20,
            sample_sweeps: 50,
            seed: Some(5),
            variant,
            ..Default::default()
        }
    }

    #[test]
    fn test_phases_advance_in_order() {
        let mut driver =
            Driver::new(small_config(Variant::Population), UniformSource::seeded(1), MonotonicCounter::new())
                .unwrap();
        assert_eq!(driver.phase(), Phase::Init);
        driver.initialize().unwrap();
        assert_eq!(driver.phase(), Phase::Warmup);
        driver.equilibrate().unwrap();
        assert_eq!(driver.phase(), Phase::Measure);
        driver.measure().unwrap();
        assert_eq!(driver.phase(), Phase::Report);
        driver.report().unwrap();
        assert_eq!(driver.phase(), Phase::Done);
    }

    #[test]
    fn test_out_of_order_phase_rejected() {
        let mut driver =
            Driver::new(small_config(Variant::Population), UniformSource::seeded(1), MonotonicCounter::new())
                .unwrap();
        let err = driver.measure().unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidPhase {
                expected: Phase::Measure,
                found: Phase::Init
            }
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SamplerConfig {
            population: 0,
            ..Default::default()
        };
        assert!(Driver::new(config, ReplaySource::default(), MonotonicCounter::new()).is_err());
    }

    #[test]
    fn test_counter_brackets_only_measurement() {
        let counter = StepCounter { ticks: 0, step: 1000 };
        let mut driver =
            Driver::new(small_config(Variant::Population), UniformSource::seeded(2), counter).unwrap();
        let report = driver.run().unwrap();
        // two readings, one step apart
        assert_eq!(report.cycles, 1000);
        assert_eq!(report.samples, 64 * 50);
        assert_eq!(report.unit, "ticks");
    }

    #[test]
    fn test_measure_with_counts_every_invocation() {
        let mut driver =
            Driver::new(small_config(Variant::Population), UniformSource::seeded(3), MonotonicCounter::new())
                .unwrap();
        driver.initialize().unwrap();
        driver.equilibrate().unwrap();

        let mut calls = 0u64;
        let measurement = driver
            .measure_with(|r, x, p| {
                calls += 1;
                kernel(r, x, p)
            })
            .unwrap();
        assert_eq!(calls, 64 * 50);
        assert_eq!(measurement.samples, calls);
    }

    #[test]
    fn test_single_chain_sample_count() {
        let mut driver =
            Driver::new(small_config(Variant::SingleChain), UniformSource::seeded(4), MonotonicCounter::new())
                .unwrap();
        driver.initialize().unwrap();
        assert_eq!(driver.population().map(Population::len), Some(1));
        driver.equilibrate().unwrap();
        let measurement = driver.measure().unwrap();
        assert_eq!(measurement.samples, 64 * 50);
    }

    #[test]
    fn test_observer_sees_every_sweep() {
        for &variant in Variant::all() {
            let mut driver =
                Driver::new(small_config(variant), UniformSource::seeded(6), MonotonicCounter::new())
                    .unwrap();
            driver.initialize().unwrap();
            driver.equilibrate().unwrap();

            let mut seen = Vec::new();
            let measurement = driver.measure_observed(|i| seen.push(i)).unwrap();
            assert_eq!(seen, (0..50).collect::<Vec<u64>>(), "{}", variant);
            assert_eq!(measurement.samples, 64 * 50);
        }
    }

    #[test]
    fn test_observer_leaves_samples_unchanged() {
        let run = |observe: bool| {
            let mut driver =
                Driver::new(small_config(Variant::Population), UniformSource::seeded(9), MonotonicCounter::new())
                    .unwrap();
            driver.initialize().unwrap();
            driver.equilibrate().unwrap();
            if observe {
                driver.measure_observed(|_| {}).unwrap()
            } else {
                driver.measure().unwrap()
            }
        };
        assert_eq!(run(true).sum.to_bits(), run(false).sum.to_bits());
    }

    #[test]
    fn test_predrawn_matches_population_bit_for_bit() {
        let run = |variant| {
            let mut driver =
                Driver::new(small_config(variant), UniformSource::seeded(77), MonotonicCounter::new())
                    .unwrap();
            driver.initialize().unwrap();
            driver.equilibrate().unwrap();
            let measurement = driver.measure().unwrap();
            (measurement, driver.population().cloned())
        };
        let (scalar, scalar_pop) = run(Variant::Population);
        let (predrawn, predrawn_pop) = run(Variant::Predrawn);
        assert_eq!(scalar.sum.to_bits(), predrawn.sum.to_bits());
        assert_eq!(scalar.accepted, predrawn.accepted);
        assert_eq!(scalar_pop, predrawn_pop);
    }

    #[test]
    fn test_population_stays_consistent() {
        let mut driver =
            Driver::new(small_config(Variant::Population), UniformSource::seeded(8), MonotonicCounter::new())
                .unwrap();
        driver.run().unwrap();
        assert!(driver.population().unwrap().is_consistent());
    }
}
