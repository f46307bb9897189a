//! mcvec benchmarking framework
//!
//! This crate provides the harness around the sampling kernel:
//! - a `Benchmark` trait and serializable result records
//! - `SamplingBenchmark`, one kernel variant under one configuration
//! - a comparison framework ranking variants against each other

use std::path::Path;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

pub mod runner;
pub mod sampling;

pub use sampling::SamplingBenchmark;

/// Result of a benchmark run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub name: String,
    pub iterations: u32,
    pub total_time: Duration,
    pub mean_time: Duration,
    pub min_time: Duration,
    pub max_time: Duration,
    pub stddev: Option<f64>,
    pub throughput: Option<f64>,
    pub metadata: serde_json::Value,
}

impl BenchmarkResult {
    /// Result record summarizing individually timed sweeps.
    ///
    /// `total_time` covers the whole measured region; the per-sweep figures
    /// come from `times`.
    pub fn from_sweep_times(
        name: &str,
        times: &[Duration],
        total_time: Duration,
    ) -> anyhow::Result<Self> {
        let stats = SweepStats::from_times(times)
            .ok_or_else(|| anyhow::anyhow!("{} recorded no sweeps", name))?;
        let iterations = u32::try_from(times.len())?;

        Ok(Self {
            name: name.to_string(),
            iterations,
            total_time,
            mean_time: stats.mean,
            min_time: stats.min,
            max_time: stats.max,
            stddev: Some(stats.stddev_nanos),
            throughput: None,
            metadata: serde_json::Value::Null,
        })
    }

    /// Cycles per sample recorded by a sampling run, if any
    pub fn cycles_per_sample(&self) -> Option<f64> {
        self.metadata
            .get("report")
            .and_then(|r| r.get("cycles_per_sample"))
            .and_then(serde_json::Value::as_f64)
    }
}

/// Spread of a set of sweep durations
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepStats {
    pub mean: Duration,
    pub min: Duration,
    pub max: Duration,
    /// Population standard deviation in nanoseconds
    pub stddev_nanos: f64,
}

impl SweepStats {
    /// `None` for an empty slice
    pub fn from_times(times: &[Duration]) -> Option<Self> {
        let min = *times.iter().min()?;
        let max = *times.iter().max()?;
        let count = times.len() as f64;

        let nanos = || times.iter().map(|d| d.as_nanos() as f64);
        let mean_nanos = nanos().sum::<f64>() / count;
        let variance = nanos().map(|t| (t - mean_nanos).powi(2)).sum::<f64>() / count;

        Some(Self {
            // clamp so rounding never pushes the mean outside [min, max]
            mean: Duration::from_nanos(mean_nanos.round() as u64).clamp(min, max),
            min,
            max,
            stddev_nanos: variance.sqrt(),
        })
    }
}

/// Trait for implementing comparable benchmarks
pub trait Benchmark {
    /// Name of the benchmark
    fn name(&self) -> &str;

    /// Run the benchmark and return results
    fn run(&mut self) -> anyhow::Result<BenchmarkResult>;

    /// Optional warmup before benchmarking
    fn warmup(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Framework for comparing different loop variants
pub struct ComparisonFramework {
    benchmarks: Vec<Box<dyn Benchmark>>,
    results: Vec<BenchmarkResult>,
}

impl Default for ComparisonFramework {
    fn default() -> Self {
        Self::new()
    }
}

impl ComparisonFramework {
    pub fn new() -> Self {
        Self {
            benchmarks: Vec::new(),
            results: Vec::new(),
        }
    }

    /// Add a benchmark to the comparison
    pub fn add_benchmark(&mut self, benchmark: Box<dyn Benchmark>) {
        self.benchmarks.push(benchmark);
    }

    /// Run all benchmarks
    pub fn run_all(&mut self) -> anyhow::Result<()> {
        self.results.clear();

        for benchmark in &mut self.benchmarks {
            tracing::info!("Running benchmark: {}", benchmark.name());

            benchmark.warmup()?;

            let result = benchmark.run()?;
            self.results.push(result);
        }

        Ok(())
    }

    pub fn results(&self) -> &[BenchmarkResult] {
        &self.results
    }

    /// Generate comparison report
    pub fn generate_report(&self) -> ComparisonReport {
        ComparisonReport::new(self.results.clone())
    }

    /// Save results to JSON file
    pub fn save_results(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(&self.results)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Comparison report with analysis
#[derive(Debug, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub results: Vec<BenchmarkResult>,
    pub analysis: ComparisonAnalysis,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ComparisonAnalysis {
    pub fastest: Option<String>,
    pub slowest: Option<String>,
    pub relative_performance: Vec<RelativePerformance>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RelativePerformance {
    pub name: String,
    pub relative_to_fastest: f64,
    pub relative_to_baseline: Option<f64>,
}

impl ComparisonReport {
    pub fn new(results: Vec<BenchmarkResult>) -> Self {
        let analysis = Self::analyze(&results);
        Self { results, analysis }
    }

    /// Cost used for ranking: cycles per sample when the run recorded a
    /// report, the mean sweep time otherwise.
    fn cost(result: &BenchmarkResult) -> f64 {
        result
            .cycles_per_sample()
            .unwrap_or_else(|| result.mean_time.as_nanos() as f64)
    }

    fn analyze(results: &[BenchmarkResult]) -> ComparisonAnalysis {
        let by_cost = |a: &&BenchmarkResult, b: &&BenchmarkResult| Self::cost(a).total_cmp(&Self::cost(b));
        let fastest = results.iter().min_by(by_cost);
        let slowest = results.iter().max_by(by_cost);

        let floor = |cost: f64| cost.max(f64::MIN_POSITIVE);
        let fastest_cost = fastest.map(|r| floor(Self::cost(r)));
        // the first variant added is the baseline
        let baseline_cost = results.first().map(|r| floor(Self::cost(r)));

        let relative_performance = results
            .iter()
            .map(|r| {
                let cost = Self::cost(r);
                RelativePerformance {
                    name: r.name.clone(),
                    relative_to_fastest: fastest_cost.map_or(1.0, |f| cost / f),
                    relative_to_baseline: baseline_cost.map(|b| cost / b),
                }
            })
            .collect();

        ComparisonAnalysis {
            fastest: fastest.map(|r| r.name.clone()),
            slowest: slowest.map(|r| r.name.clone()),
            relative_performance,
        }
    }

    /// Generate markdown report
    pub fn to_markdown(&self) -> String {
        let mut report = String::new();

        report.push_str("# Kernel Variant Comparison\n\n");

        if let Some(fastest) = &self.analysis.fastest {
            report.push_str(&format!("**Fastest**: {}\n", fastest));
        }
        if let Some(slowest) = &self.analysis.slowest {
            report.push_str(&format!("**Slowest**: {}\n\n", slowest));
        }

        report.push_str("## Results\n\n");
        report.push_str("| Variant | Mean Sweep | Cost/Sample | Relative to Fastest | Relative to Baseline |\n");
        report.push_str("|---------|------------|-------------|---------------------|----------------------|\n");

        for (result, perf) in self.results.iter().zip(&self.analysis.relative_performance) {
            let cost = result
                .cycles_per_sample()
                .map(|c| format!("{:.2}", c))
                .unwrap_or_else(|| "-".to_string());
            report.push_str(&format!(
                "| {} | {:.3}ms | {} | {:.2}x | {:.2}x |\n",
                result.name,
                result.mean_time.as_secs_f64() * 1000.0,
                cost,
                perf.relative_to_fastest,
                perf.relative_to_baseline.unwrap_or(1.0),
            ));
        }

        report
    }
}

/// Helper function to measure execution time
pub fn measure_time<F, R>(f: F) -> (Duration, R)
where
    F: FnOnce() -> R,
{
    let start = Instant::now();
    let result = f();
    let duration = start.elapsed();
    (duration, result)
}
