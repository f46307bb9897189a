//! Measurement record and the derived report

use std::fmt;

use serde::{Deserialize, Serialize};

/// Significant digits used when printing report values
pub const REPORT_PRECISION: usize = 10;

/// Raw outcome of one measurement phase
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Measurement {
    /// Sum of sampled positions
    pub sum: f64,
    /// Kernel invocations inside the timed region
    pub samples: u64,
    /// Counter ticks between the two readings
    pub cycles: u64,
    /// Accepted proposals
    pub accepted: u64,
}

/// Integral estimate and cost per sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub estimate: f64,
    pub samples: u64,
    pub cycles: u64,
    pub cycles_per_sample: f64,
    pub acceptance_rate: f64,
    pub unit: String,
}

impl Report {
    /// Pure division of the recorded numbers.
    pub fn from_measurement(measurement: &Measurement, unit: &str) -> Self {
        let samples = measurement.samples as f64;
        Self {
            estimate: measurement.sum / samples,
            samples: measurement.samples,
            cycles: measurement.cycles,
            cycles_per_sample: measurement.cycles as f64 / samples,
            acceptance_rate: measurement.accepted as f64 / samples,
            unit: unit.to_string(),
        }
    }

    pub fn integral_line(&self) -> String {
        format!(
            "the integral is {} over {} points",
            format_significant(self.estimate, REPORT_PRECISION),
            self.samples
        )
    }

    pub fn cost_line(&self) -> String {
        format!(
            "{} {} per point",
            format_significant(self.cycles_per_sample, REPORT_PRECISION),
            self.unit
        )
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.integral_line())?;
        write!(f, "{}", self.cost_line())
    }
}

/// Format with `digits` significant digits in fixed notation.
pub fn format_significant(value: f64, digits: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let digits = digits.max(1) as i32;
    let magnitude = if value == 0.0 {
        0
    } else {
        value.abs().log10().floor() as i32
    };
    let decimals = (digits - 1 - magnitude).max(0) as usize;
    format!("{:.*}", decimals, value)
}
