//! Loop structurings of the same sampling procedure
//!
//! Every variant applies the same acceptance rule to the same target density
//! and records the same number of samples; they differ only in how the loops
//! are laid out, which is what decides whether the compiler can vectorize
//! the hot loop.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::kernel::select_step;
use crate::random::RandomSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// Sweep-major outer loop over a population held in two parallel vectors
    #[default]
    Population,
    /// One walker advanced for the whole run
    SingleChain,
    /// Draws for a sweep are generated up front, then a branch-free pass
    /// applies the acceptance rule
    Predrawn,
}

impl Variant {
    pub fn all() -> &'static [Variant] {
        &[Variant::Population, Variant::SingleChain, Variant::Predrawn]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Variant::Population => "population",
            Variant::SingleChain => "single-chain",
            Variant::Predrawn => "predrawn",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Variant::Population => "sweeps over two parallel vectors, branchy write-back",
            Variant::SingleChain => "one walker, no population",
            Variant::Predrawn => "draws buffered per sweep, select instead of branch",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Variant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "population" | "pop" => Ok(Variant::Population),
            "single-chain" | "single" | "chain" => Ok(Variant::SingleChain),
            "predrawn" | "select" => Ok(Variant::Predrawn),
            other => Err(Error::InvalidConfig(format!("unknown variant: {}", other))),
        }
    }
}

/// One pass of `step` over every particle. Returns accepted proposals.
#[inline]
pub fn sweep<R, F>(rng: &mut R, positions: &mut [f64], weights: &mut [f64], step: &mut F) -> u64
where
    R: RandomSource + ?Sized,
    F: FnMut(&mut R, &mut f64, &mut f64) -> bool,
{
    let mut accepted = 0;
    for (x, p) in positions.iter_mut().zip(weights.iter_mut()) {
        accepted += u64::from(step(rng, x, p));
    }
    accepted
}

/// As [`sweep`], adding each particle's post-step position into `sum`.
#[inline]
pub fn sweep_accumulate<R, F>(
    rng: &mut R,
    positions: &mut [f64],
    weights: &mut [f64],
    step: &mut F,
    sum: &mut f64,
) -> u64
where
    R: RandomSource + ?Sized,
    F: FnMut(&mut R, &mut f64, &mut f64) -> bool,
{
    let mut accepted = 0;
    for (x, p) in positions.iter_mut().zip(weights.iter_mut()) {
        accepted += u64::from(step(rng, x, p));
        *sum += *x;
    }
    accepted
}

/// Scratch buffers holding one sweep's worth of draws.
#[derive(Debug, Clone, Default)]
pub struct DrawBuffers {
    pub propose: Vec<f64>,
    pub accept: Vec<f64>,
}

impl DrawBuffers {
    /// Fill both buffers, consuming draws in the same order the scalar
    /// kernel does: proposal then acceptance, particle by particle.
    #[inline]
    pub fn fill<R: RandomSource + ?Sized>(&mut self, rng: &mut R) {
        for (u1, u2) in self.propose.iter_mut().zip(self.accept.iter_mut()) {
            *u1 = rng.drand();
            *u2 = rng.drand();
        }
    }
}

/// Branch-free pass over a population with pre-filled draws.
#[inline]
pub fn predrawn_sweep(positions: &mut [f64], weights: &mut [f64], draws: &DrawBuffers) -> u64 {
    let mut accepted = 0;
    let lanes = positions
        .iter_mut()
        .zip(weights.iter_mut())
        .zip(draws.propose.iter().zip(&draws.accept));
    for ((x, p), (&u1, &u2)) in lanes {
        let (nx, np, acc) = select_step(*x, *p, u1, u2);
        *x = nx;
        *p = np;
        accepted += u64::from(acc);
    }
    accepted
}

/// As [`predrawn_sweep`], adding each post-step position into `sum` in
/// particle order.
#[inline]
pub fn predrawn_sweep_accumulate(
    positions: &mut [f64],
    weights: &mut [f64],
    draws: &DrawBuffers,
    sum: &mut f64,
) -> u64 {
    let mut accepted = 0;
    let lanes = positions
        .iter_mut()
        .zip(weights.iter_mut())
        .zip(draws.propose.iter().zip(&draws.accept));
    for ((x, p), (&u1, &u2)) in lanes {
        let (nx, np, acc) = select_step(*x, *p, u1, u2);
        *x = nx;
        *p = np;
        accepted += u64::from(acc);
        *sum += nx;
    }
    accepted
}
