//! Particle population stored as two index-aligned buffers

use crate::error::{Error, Result};
use crate::kernel::{density, propose};
use crate::random::RandomSource;

/// Positions and weights of `len` independent particles.
///
/// `weights[i]` is always `exp(-positions[i])`.
#[derive(Debug, Clone, PartialEq)]
pub struct Population {
    positions: Vec<f64>,
    weights: Vec<f64>,
}

impl Population {
    /// Allocate `len` particles and draw their initial positions.
    pub fn initialize<R: RandomSource + ?Sized>(len: usize, rng: &mut R) -> Result<Self> {
        let mut positions = try_alloc(len)?;
        let mut weights = try_alloc(len)?;

        for _ in 0..len {
            let x = propose(rng);
            positions.push(x);
            weights.push(density(x));
        }

        Ok(Self { positions, weights })
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[f64] {
        &self.positions
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Both buffers, mutably, for the sweep loops.
    pub fn split_mut(&mut self) -> (&mut [f64], &mut [f64]) {
        (&mut self.positions, &mut self.weights)
    }

    /// Check the domain and density invariant for every particle.
    pub fn is_consistent(&self) -> bool {
        self.positions
            .iter()
            .zip(&self.weights)
            .all(|(&x, &p)| (0.0..crate::kernel::DOMAIN_WIDTH).contains(&x) && p == density(x))
    }
}

pub(crate) fn try_alloc(len: usize) -> Result<Vec<f64>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| Error::OutOfMemory { requested: len })?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{ReplaySource, UniformSource};

    #[test]
    fn test_initialize_establishes_invariant() {
        let mut rng = UniformSource::seeded(3);
        let population = Population::initialize(4096, &mut rng).unwrap();
        assert_eq!(population.len(), 4096);
        assert!(population.is_consistent());
    }

    #[test]
    fn test_initialize_uses_one_draw_per_particle() {
        let mut rng = ReplaySource::new(vec![0.5]);
        let population = Population::initialize(10, &mut rng).unwrap();
        assert_eq!(rng.taken(), 10);
        assert!(population.positions().iter().all(|&x| x == 11.5));
    }

    #[test]
    fn test_impossible_allocation_is_reported() {
        let mut rng = ReplaySource::default();
        let err = Population::initialize(usize::MAX, &mut rng).unwrap_err();
        assert!(matches!(err, Error::OutOfMemory { requested } if requested == usize::MAX));
    }
}
