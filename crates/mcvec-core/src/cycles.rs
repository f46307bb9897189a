//! Cycle counters bracketing the measured region
//!
//! Only the difference of two readings is meaningful.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{compiler_fence, Ordering};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Monotonically increasing 64-bit counter.
pub trait CycleCounter {
    /// Current reading since an arbitrary epoch
    fn now(&mut self) -> u64;

    /// Unit of one tick, for reports
    fn unit(&self) -> &'static str;
}

impl<T: CycleCounter + ?Sized> CycleCounter for Box<T> {
    fn now(&mut self) -> u64 {
        (**self).now()
    }

    fn unit(&self) -> &'static str {
        (**self).unit()
    }
}

/// Time stamp counter read with `rdtsc`.
#[cfg(target_arch = "x86_64")]
#[derive(Debug, Default, Clone, Copy)]
pub struct TscCounter;

#[cfg(target_arch = "x86_64")]
impl CycleCounter for TscCounter {
    #[inline]
    fn now(&mut self) -> u64 {
        compiler_fence(Ordering::SeqCst);
        // SAFETY: rdtsc is available on every x86_64 CPU and has no memory effects.
        let ticks = unsafe { core::arch::x86_64::_rdtsc() };
        compiler_fence(Ordering::SeqCst);
        ticks
    }

    fn unit(&self) -> &'static str {
        "cycles"
    }
}

/// Nanoseconds elapsed since the counter was created.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicCounter {
    origin: Instant,
}

impl MonotonicCounter {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl CycleCounter for MonotonicCounter {
    #[inline]
    fn now(&mut self) -> u64 {
        compiler_fence(Ordering::SeqCst);
        let nanos = self.origin.elapsed().as_nanos() as u64;
        compiler_fence(Ordering::SeqCst);
        nanos
    }

    fn unit(&self) -> &'static str {
        "ns"
    }
}

/// Counter selectable at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CounterKind {
    /// Hardware time stamp counter where available
    Tsc,
    /// `Instant`-based nanosecond clock
    Monotonic,
}

impl Default for CounterKind {
    fn default() -> Self {
        if cfg!(target_arch = "x86_64") {
            CounterKind::Tsc
        } else {
            CounterKind::Monotonic
        }
    }
}

impl CounterKind {
    /// Build the counter. Falls back to the monotonic clock when the
    /// hardware counter does not exist on this target.
    pub fn build(self) -> Box<dyn CycleCounter> {
        match self {
            #[cfg(target_arch = "x86_64")]
            CounterKind::Tsc => Box::new(TscCounter),
            #[cfg(not(target_arch = "x86_64"))]
            CounterKind::Tsc => {
                tracing::warn!("rdtsc unavailable on this target, using monotonic clock");
                Box::new(MonotonicCounter::new())
            }
            CounterKind::Monotonic => Box::new(MonotonicCounter::new()),
        }
    }
}

impl fmt::Display for CounterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CounterKind::Tsc => write!(f, "tsc"),
            CounterKind::Monotonic => write!(f, "monotonic"),
        }
    }
}

impl FromStr for CounterKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tsc" | "rdtsc" | "cycles" => Ok(CounterKind::Tsc),
            "monotonic" | "ns" | "instant" => Ok(CounterKind::Monotonic),
            other => Err(Error::InvalidConfig(format!("unknown counter: {}", other))),
        }
    }
}

/// Elapsed ticks between two readings.
#[inline]
pub fn elapsed(start: u64, end: u64) -> u64 {
    end.wrapping_sub(start)
}
