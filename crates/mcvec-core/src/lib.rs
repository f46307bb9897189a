//! mcvec core - Metropolis sampling kernel and benchmark driver
//!
//! This crate provides the pieces of a micro-benchmark that times a
//! Metropolis accept/reject kernel over a particle population:
//! - explicit, seedable uniform random sources
//! - the accept/reject kernel for the density `exp(-x)` on [0, 23)
//! - a phase-ordered driver (init, warm-up, measure, report)
//! - cycle counters bracketing the measured region
//! - loop variants used to compare how the hot loop vectorizes

pub mod config;
pub mod cycles;
pub mod driver;
pub mod error;
pub mod kernel;
pub mod population;
pub mod random;
pub mod report;
pub mod variants;

pub use config::SamplerConfig;
pub use cycles::{CounterKind, CycleCounter, MonotonicCounter};
#[cfg(target_arch = "x86_64")]
pub use cycles::TscCounter;
pub use driver::{Driver, Phase};
pub use error::{Error, Result};
pub use kernel::{kernel, DOMAIN_WIDTH};
pub use population::Population;
pub use random::{RandomSource, ReplaySource, UniformSource};
pub use report::{Measurement, Report};
pub use variants::Variant;

/// Commonly used items
pub mod prelude {
    pub use crate::{
        CounterKind, CycleCounter, Driver, Measurement, Phase, RandomSource, Report,
        SamplerConfig, UniformSource, Variant,
    };
}
