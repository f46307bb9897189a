//! Uniform random draws on [0, 1)
//!
//! The generator state is an explicit value owned by whoever drives the
//! sampler, so two drivers never share a stream and a seed makes a run
//! reproducible.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// Largest value of the native 31-bit integer range.
pub const RAND_MAX: u32 = (1 << 31) - 1;

/// Scale from the native integer range onto [0, 1).
const FAC: f64 = 1.0 / (RAND_MAX as f64 - 1.0);

/// Source of uniformly distributed doubles.
pub trait RandomSource {
    /// Next draw, uniform on [0, 1).
    fn drand(&mut self) -> f64;
}

impl<T: RandomSource + ?Sized> RandomSource for &mut T {
    #[inline]
    fn drand(&mut self) -> f64 {
        (**self).drand()
    }
}

/// Uniform source backed by a `rand` generator.
///
/// Native draws come from `[0, RAND_MAX - 1)` and are scaled by
/// `1 / (RAND_MAX - 1)`, which keeps every result strictly below 1.0.
#[derive(Debug, Clone)]
pub struct UniformSource<R: RngCore = StdRng> {
    rng: R,
}

impl UniformSource<StdRng> {
    /// Reproducible source for a fixed seed
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Source seeded from the operating system
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Seeded when a seed is given, entropy otherwise
    pub fn from_seed_option(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }
}

impl<R: RngCore> UniformSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: RngCore> RandomSource for UniformSource<R> {
    #[inline]
    fn drand(&mut self) -> f64 {
        FAC * f64::from(self.rng.gen_range(0..RAND_MAX - 1))
    }
}

/// Replays a fixed sequence of draws, starting over when it runs out.
///
/// An empty sequence yields 0.0 forever.
#[derive(Debug, Clone, Default)]
pub struct ReplaySource {
    draws: Vec<f64>,
    cursor: usize,
    taken: u64,
}

impl ReplaySource {
    pub fn new(draws: impl Into<Vec<f64>>) -> Self {
        Self {
            draws: draws.into(),
            cursor: 0,
            taken: 0,
        }
    }

    /// Total number of draws handed out so far
    pub fn taken(&self) -> u64 {
        self.taken
    }
}

impl RandomSource for ReplaySource {
    fn drand(&mut self) -> f64 {
        self.taken += 1;
        if self.draws.is_empty() {
            return 0.0;
        }
        let value = self.draws[self.cursor];
        self.cursor = (self.cursor + 1) % self.draws.len();
        value
    }
}
