//! Metropolis accept/reject step for the density `exp(-x)` on [0, 23)

use crate::random::RandomSource;

/// Width of the sampling domain. Every position lies in `[0, DOMAIN_WIDTH)`.
pub const DOMAIN_WIDTH: f64 = 23.0;

/// Unnormalized target density.
#[inline]
pub fn density(x: f64) -> f64 {
    (-x).exp()
}

/// Uniform proposal over the domain.
#[inline]
pub fn propose<R: RandomSource + ?Sized>(rng: &mut R) -> f64 {
    rng.drand() * DOMAIN_WIDTH
}

/// One accept/reject step on a single particle.
///
/// Draws a proposal, then accepts it iff `exp(-x_new) > u * weight` for a
/// second draw `u`, comparing against the current weight. On acceptance
/// both `position` and `weight` are overwritten; on rejection neither is
/// touched. Returns whether the proposal was accepted.
///
/// The branchy per-element write-back and the two serial draws are what
/// keep this loop scalar; keep them as they are.
#[inline]
pub fn kernel<R: RandomSource + ?Sized>(rng: &mut R, position: &mut f64, weight: &mut f64) -> bool {
    let x_new = propose(rng);
    let p_new = density(x_new);
    if p_new > rng.drand() * *weight {
        *position = x_new;
        *weight = p_new;
        true
    } else {
        false
    }
}

/// Branch-free form of the acceptance rule given both draws up front.
///
/// Returns the post-step `(position, weight, accepted)`; the result equals
/// what [`kernel`] produces when fed `u_propose` then `u_accept`.
#[inline]
pub fn select_step(position: f64, weight: f64, u_propose: f64, u_accept: f64) -> (f64, f64, bool) {
    let x_new = u_propose * DOMAIN_WIDTH;
    let p_new = density(x_new);
    let accept = p_new > u_accept * weight;
    let x = if accept { x_new } else { position };
    let p = if accept { p_new } else { weight };
    (x, p, accept)
}
