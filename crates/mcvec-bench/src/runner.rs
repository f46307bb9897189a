//! Benchmark runner utilities

use std::path::{Path, PathBuf};

use mcvec_core::SamplerConfig;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{Benchmark, BenchmarkResult};

/// Benchmark suite runner
pub struct BenchmarkRunner {
    benchmarks: Vec<Box<dyn Benchmark>>,
    results: Vec<BenchmarkResult>,
    output_dir: PathBuf,
}

impl BenchmarkRunner {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            benchmarks: Vec::new(),
            results: Vec::new(),
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    /// Add a benchmark to the suite
    pub fn add_benchmark(&mut self, benchmark: Box<dyn Benchmark>) {
        self.benchmarks.push(benchmark);
    }

    /// Run all benchmarks in the suite; a failing benchmark is logged and
    /// skipped. Returns the paths of the JSON results and markdown report.
    pub fn run_all(&mut self) -> anyhow::Result<(PathBuf, PathBuf)> {
        info!("Starting benchmark suite with {} benchmarks", self.benchmarks.len());

        std::fs::create_dir_all(&self.output_dir)?;

        self.results.clear();

        let total_benchmarks = self.benchmarks.len();

        for (i, benchmark) in self.benchmarks.iter_mut().enumerate() {
            info!("Running benchmark {}/{}: {}", i + 1, total_benchmarks, benchmark.name());

            if let Err(e) = benchmark.warmup() {
                warn!("Warmup failed for {}: {}", benchmark.name(), e);
                continue;
            }

            match benchmark.run() {
                Ok(result) => {
                    info!(
                        "Benchmark {} completed: mean sweep = {:?}",
                        benchmark.name(),
                        result.mean_time
                    );
                    self.results.push(result);
                }
                Err(e) => {
                    warn!("Benchmark {} failed: {}", benchmark.name(), e);
                }
            }
        }

        self.save_results()
    }

    /// Save benchmark results to disk
    fn save_results(&self) -> anyhow::Result<(PathBuf, PathBuf)> {
        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");

        let json_path = self.output_dir.join(format!("results_{}.json", timestamp));
        let json = serde_json::to_string_pretty(&self.results)?;
        std::fs::write(&json_path, json)?;
        info!("Results saved to {:?}", json_path);

        let md_path = self.output_dir.join(format!("report_{}.md", timestamp));
        std::fs::write(&md_path, self.generate_markdown_report())?;
        info!("Report saved to {:?}", md_path);

        Ok((json_path, md_path))
    }

    /// Generate a markdown report of the results
    pub fn generate_markdown_report(&self) -> String {
        let mut report = String::new();

        report.push_str(&format!(
            "# mcvec Benchmark Report\n\nGenerated: {}\n\n",
            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
        ));

        report.push_str("## Summary\n\n");
        report.push_str(&format!("Total benchmarks run: {}\n\n", self.results.len()));

        report.push_str("## Results\n\n");
        report.push_str("| Benchmark | Sweeps | Mean Sweep | Total Time | Cost/Sample | Samples/sec |\n");
        report.push_str("|-----------|--------|------------|------------|-------------|-------------|\n");

        for result in &self.results {
            report.push_str(&format!(
                "| {} | {} | {:.3}ms | {:.3}s | {} | {:.3e} |\n",
                result.name,
                result.iterations,
                result.mean_time.as_secs_f64() * 1000.0,
                result.total_time.as_secs_f64(),
                result
                    .cycles_per_sample()
                    .map(|c| format!("{:.2}", c))
                    .unwrap_or_else(|| "-".to_string()),
                result.throughput.unwrap_or(0.0),
            ));
        }

        report.push_str("\n## Detailed Results\n\n");

        for result in &self.results {
            report.push_str(&format!("### {}\n\n", result.name));

            if !result.metadata.is_null() {
                report.push_str(&format!(
                    "- **Metadata**: {}\n",
                    serde_json::to_string_pretty(&result.metadata).unwrap_or_default()
                ));
            }

            report.push('\n');
        }

        report
    }

    /// Get the results
    pub fn results(&self) -> &[BenchmarkResult] {
        &self.results
    }
}

/// Profile-based run sizes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkProfile {
    pub name: String,
    pub population: usize,
    pub warmup_sweeps: u32,
    pub sample_sweeps: u32,
}

impl BenchmarkProfile {
    /// Quick profile for fast benchmarking
    pub fn quick() -> Self {
        Self {
            name: "quick".to_string(),
            population: 1024,
            warmup_sweeps: 100,
            sample_sweeps: 1000,
        }
    }

    /// Standard profile: the reference run
    pub fn standard() -> Self {
        Self {
            name: "standard".to_string(),
            population: mcvec_core::config::DEFAULT_POPULATION,
            warmup_sweeps: mcvec_core::config::DEFAULT_WARMUP_SWEEPS,
            sample_sweeps: mcvec_core::config::DEFAULT_SAMPLE_SWEEPS,
        }
    }

    /// Comprehensive profile for thorough benchmarking
    pub fn comprehensive() -> Self {
        Self {
            name: "comprehensive".to_string(),
            population: 10240,
            warmup_sweeps: 2000,
            sample_sweeps: 50000,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "quick" => Some(Self::quick()),
            "standard" => Some(Self::standard()),
            "comprehensive" => Some(Self::comprehensive()),
            _ => None,
        }
    }

    pub fn all() -> Vec<Self> {
        vec![Self::quick(), Self::standard(), Self::comprehensive()]
    }

    /// Apply the profile's sizes on top of `base`
    pub fn apply(&self, base: &SamplerConfig) -> SamplerConfig {
        SamplerConfig {
            population: self.population,
            warmup_sweeps: self.warmup_sweeps,
            sample_sweeps: self.sample_sweeps,
            ..base.clone()
        }
    }
}
