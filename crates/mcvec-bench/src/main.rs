//! mcvec benchmark CLI
//!
//! With no arguments this runs the reference benchmark and prints the
//! integral estimate and the cost per sample.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use mcvec_bench::{
    runner::{BenchmarkProfile, BenchmarkRunner},
    BenchmarkResult, ComparisonFramework, SamplingBenchmark,
};
use mcvec_core::prelude::*;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mcvec-bench")]
#[command(about = "Times a Metropolis sampling kernel and reports cycles per sample")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory to write results into
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Errors only
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one variant and print the estimate and cost per sample
    Run(RunArgs),

    /// Run every variant and compare them
    Compare(CompareArgs),

    /// Run every variant under each requested profile and save the results
    Suite(SuiteArgs),

    /// List variants and profiles
    List,

    /// Show saved benchmark results
    Show(ShowArgs),
}

/// Sizes and knobs shared by the run commands
#[derive(Args, Default, Clone)]
struct SizeArgs {
    /// Benchmark profile (quick, standard, comprehensive)
    #[arg(short, long)]
    profile: Option<String>,

    /// Number of particles
    #[arg(short = 'n', long)]
    population: Option<usize>,

    /// Equilibration sweeps
    #[arg(short, long)]
    warmup: Option<u32>,

    /// Measured sweeps
    #[arg(short, long)]
    iterations: Option<u32>,

    /// Generator seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Counter bracketing the measurement (tsc, monotonic)
    #[arg(long)]
    counter: Option<String>,
}

#[derive(Args, Default)]
struct RunArgs {
    #[command(flatten)]
    sizes: SizeArgs,

    /// Loop variant (population, single-chain, predrawn)
    #[arg(long)]
    variant: Option<String>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct CompareArgs {
    #[command(flatten)]
    sizes: SizeArgs,
}

#[derive(Args)]
struct SuiteArgs {
    #[command(flatten)]
    sizes: SizeArgs,

    /// Profiles to run; defaults to the configured sizes
    #[arg(long, value_delimiter = ',')]
    profiles: Vec<String>,
}

#[derive(Args)]
struct ShowArgs {
    /// Path to results file
    results_file: PathBuf,

    /// Output format (json, markdown, table)
    #[arg(short, long, default_value = "table")]
    format: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli)?;
    debug!("mcvec-bench v{} starting", env!("CARGO_PKG_VERSION"));

    let base = load_config(cli.config.as_deref())?;

    match cli.command {
        None => run(RunArgs::default(), base, cli.output.as_deref()),
        Some(Commands::Run(args)) => run(args, base, cli.output.as_deref()),
        Some(Commands::Compare(args)) => compare(args, base, cli.output.as_deref()),
        Some(Commands::Suite(args)) => suite(args, base, cli.output.as_deref()),
        Some(Commands::List) => list(),
        Some(Commands::Show(args)) => show_results(args),
    }
}

fn init_logging(cli: &Cli) -> Result<()> {
    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<SamplerConfig> {
    match path {
        Some(path) => {
            let config = SamplerConfig::from_file(path)
                .with_context(|| format!("Failed to load config file: {}", path.display()))?;
            debug!("Configuration loaded: {:?}", config);
            Ok(config)
        }
        None => Ok(SamplerConfig::default()),
    }
}

/// Layer profile and flags over the base configuration
fn resolve_sizes(sizes: &SizeArgs, base: &SamplerConfig) -> Result<SamplerConfig> {
    let mut config = match &sizes.profile {
        Some(name) => BenchmarkProfile::from_name(name)
            .with_context(|| format!("Unknown profile: {}", name))?
            .apply(base),
        None => base.clone(),
    };

    if let Some(population) = sizes.population {
        config.population = population;
    }
    if let Some(warmup) = sizes.warmup {
        config.warmup_sweeps = warmup;
    }
    if let Some(iterations) = sizes.iterations {
        config.sample_sweeps = iterations;
    }
    if let Some(seed) = sizes.seed {
        config.seed = Some(seed);
    }
    if let Some(counter) = &sizes.counter {
        config.counter = counter.parse()?;
    }

    config.validate()?;
    Ok(config)
}

fn run(args: RunArgs, base: SamplerConfig, output: Option<&Path>) -> Result<()> {
    let mut config = resolve_sizes(&args.sizes, &base)?;
    if let Some(variant) = &args.variant {
        config.variant = variant.parse()?;
    }
    info!("Running {} with {:?}", config.variant, config);

    let rng = UniformSource::from_seed_option(config.seed);
    let counter = config.counter.build();
    let mut driver = Driver::new(config, rng, counter)?;

    driver.initialize()?;
    if !args.json {
        println!("Equilibrating ...");
    }
    driver.equilibrate()?;

    if !args.json {
        println!("Sampling and measuring performance ...");
    }
    driver.measure()?;
    let report = driver.report()?;
    let config = driver.config();

    if args.json {
        let doc = serde_json::json!({ "config": config, "report": report });
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else {
        println!("{}", report.integral_line());
        println!("{}", report.cost_line());
    }

    if let Some(dir) = output {
        std::fs::create_dir_all(dir)?;
        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("run_{}_{}.json", config.variant, timestamp));
        let doc = serde_json::json!({ "config": config, "report": report });
        std::fs::write(&path, serde_json::to_string_pretty(&doc)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Run saved to {:?}", path);
    }

    Ok(())
}

fn compare(args: CompareArgs, base: SamplerConfig, output: Option<&Path>) -> Result<()> {
    let config = resolve_sizes(&args.sizes, &base)?;
    info!("Comparing variants with {:?}", config);

    let mut framework = ComparisonFramework::new();
    for &variant in Variant::all() {
        framework.add_benchmark(Box::new(SamplingBenchmark::for_variant(&config, variant)));
    }
    framework.run_all()?;

    let report = framework.generate_report();
    let markdown = report.to_markdown();
    println!("{}", markdown);

    if let Some(dir) = output {
        std::fs::create_dir_all(dir)?;
        let report_path = dir.join("comparison_report.md");
        std::fs::write(&report_path, &markdown)?;
        framework.save_results(&dir.join("comparison_results.json"))?;
        info!("Comparison report saved to {:?}", report_path);
    }

    Ok(())
}

fn suite(args: SuiteArgs, base: SamplerConfig, output: Option<&Path>) -> Result<()> {
    let config = resolve_sizes(&args.sizes, &base)?;
    let output_dir = output.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("bench_results"));

    let profiles = args
        .profiles
        .iter()
        .map(|name| BenchmarkProfile::from_name(name).with_context(|| format!("Unknown profile: {}", name)))
        .collect::<Result<Vec<_>>>()?;

    let mut runner = BenchmarkRunner::new(&output_dir);
    let sized: Vec<SamplerConfig> = if profiles.is_empty() {
        vec![config]
    } else {
        profiles.iter().map(|p| p.apply(&config)).collect()
    };
    for config in &sized {
        for &variant in Variant::all() {
            runner.add_benchmark(Box::new(SamplingBenchmark::for_variant(config, variant)));
        }
    }

    let (json_path, md_path) = runner.run_all()?;
    println!("Results: {}", json_path.display());
    println!("Report:  {}", md_path.display());
    Ok(())
}

fn list() -> Result<()> {
    println!("Variants:");
    for variant in Variant::all() {
        println!("  - {:<14} {}", variant.name(), variant.description());
    }
    println!();
    println!("Profiles:");
    for profile in BenchmarkProfile::all() {
        println!(
            "  - {:<14} {} particles, {} warm-up sweeps, {} measured sweeps",
            profile.name, profile.population, profile.warmup_sweeps, profile.sample_sweeps
        );
    }
    println!();
    println!("Counters:");
    println!("  - tsc            hardware time stamp counter (x86_64)");
    println!("  - monotonic      nanosecond clock");

    Ok(())
}

fn show_results(args: ShowArgs) -> Result<()> {
    info!("Loading results from {:?}", args.results_file);

    let content = std::fs::read_to_string(&args.results_file)
        .with_context(|| format!("Failed to read {}", args.results_file.display()))?;
    let results: Vec<BenchmarkResult> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", args.results_file.display()))?;

    match args.format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        "table" => {
            println!(
                "{:<16} {:<10} {:<14} {:<12} {:<14}",
                "Variant", "Sweeps", "Sweep (ms)", "Total (s)", "Cost/Sample"
            );
            println!("{}", "-".repeat(70));

            for result in results {
                println!(
                    "{:<16} {:<10} {:<14.3} {:<12.3} {:<14}",
                    result.name,
                    result.iterations,
                    result.mean_time.as_secs_f64() * 1000.0,
                    result.total_time.as_secs_f64(),
                    result
                        .cycles_per_sample()
                        .map(|c| format!("{:.2}", c))
                        .unwrap_or_else(|| "-".to_string())
                );
            }
        }
        "markdown" => {
            println!("# Benchmark Results\n");
            println!("| Variant | Sweeps | Mean Sweep | Min Sweep | Max Sweep | Total Time | Cost/Sample |");
            println!("|---------|--------|------------|-----------|-----------|------------|-------------|");

            for result in results {
                println!(
                    "| {} | {} | {:.3}ms | {:.3}ms | {:.3}ms | {:.3}s | {} |",
                    result.name,
                    result.iterations,
                    result.mean_time.as_secs_f64() * 1000.0,
                    result.min_time.as_secs_f64() * 1000.0,
                    result.max_time.as_secs_f64() * 1000.0,
                    result.total_time.as_secs_f64(),
                    result
                        .cycles_per_sample()
                        .map(|c| format!("{:.2}", c))
                        .unwrap_or_else(|| "-".to_string())
                );
            }
        }
        other => {
            anyhow::bail!("Unknown format: {}. Use json, table, or markdown.", other);
        }
    }

    Ok(())
}
