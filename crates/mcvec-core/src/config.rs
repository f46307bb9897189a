//! Sampler configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cycles::CounterKind;
use crate::error::{Error, Result};
use crate::variants::Variant;

/// Default population size
pub const DEFAULT_POPULATION: usize = 10240;
/// Default number of equilibration sweeps
pub const DEFAULT_WARMUP_SWEEPS: u32 = 1000;
/// Default number of measured sweeps
pub const DEFAULT_SAMPLE_SWEEPS: u32 = 10000;

/// Parameters of one benchmark run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SamplerConfig {
    /// Number of particles
    pub population: usize,

    /// Sweeps run before measurement
    pub warmup_sweeps: u32,

    /// Sweeps inside the timed region
    pub sample_sweeps: u32,

    /// Generator seed; entropy when absent
    pub seed: Option<u64>,

    /// Counter bracketing the measurement
    pub counter: CounterKind,

    /// Loop structuring to run
    pub variant: Variant,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            population: DEFAULT_POPULATION,
            warmup_sweeps: DEFAULT_WARMUP_SWEEPS,
            sample_sweeps: DEFAULT_SAMPLE_SWEEPS,
            seed: None,
            counter: CounterKind::default(),
            variant: Variant::default(),
        }
    }
}

impl SamplerConfig {
    /// Load from a TOML file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: SamplerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot produce a measurement
    pub fn validate(&self) -> Result<()> {
        if self.population == 0 {
            return Err(Error::InvalidConfig("population must be at least 1".into()));
        }
        if self.sample_sweeps == 0 {
            return Err(Error::InvalidConfig("sample_sweeps must be at least 1".into()));
        }
        self.total_samples()?;
        Ok(())
    }

    /// Number of kernel invocations inside the timed region
    pub fn total_samples(&self) -> Result<u64> {
        u64::try_from(self.population)
            .ok()
            .and_then(|n| n.checked_mul(u64::from(self.sample_sweeps)))
            .ok_or_else(|| {
                Error::InvalidConfig(format!(
                    "{} sweeps over {} particles overflows the sample count",
                    self.sample_sweeps, self.population
                ))
            })
    }
}
