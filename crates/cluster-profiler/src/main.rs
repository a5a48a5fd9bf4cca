//! CLI entry point for the cluster profiler.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use cluster_profiler::{ClusterProfiler, ProfileReport, ProfilerConfig, io, summary};
use polars::prelude::DataFrame;
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Per-cluster summaries and rule-based labels for clustered records",
    long_about = "Reads a CSV of records with a cluster assignment and writes one labeled\n\
                  summary per cluster as JSON.\n\n\
                  EXAMPLES:\n  \
                  # Default input and output names\n  \
                  cluster-profiler\n\n  \
                  # Explicit paths\n  \
                  cluster-profiler -i data/donors.csv -o out/clusters.json\n\n  \
                  # Preview the normalized schema and aggregation plan\n  \
                  cluster-profiler -i data/donors.csv --dry-run\n\n  \
                  # Print summaries to stdout\n  \
                  cluster-profiler -i data/donors.csv --json | jq '.[0].label'"
)]
struct Args {
    /// Path to the clustered CSV file
    #[arg(short, long, default_value = "donor_vectors_clustered.csv")]
    input: PathBuf,

    /// Path of the JSON summary file to write
    #[arg(short, long, default_value = "donor_clusters_labeled.json")]
    output: PathBuf,

    /// JSON file with a profiler configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Show the normalized schema and aggregation plan without writing output
    #[arg(long)]
    dry_run: bool,

    /// Print the summaries JSON to stdout instead of writing a file
    ///
    /// Disables all logs so stdout only carries JSON.
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings, errors and the final result)
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is disabled to keep stdout pure JSON.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    let config = load_config(args.config.as_deref())?;
    let profiler = ClusterProfiler::builder().config(config).build()?;

    info!("Loading dataset from: {}", args.input.display());
    let data = io::read_csv(&args.input)
        .with_context(|| format!("Failed to load {}", args.input.display()))?;
    info!("Dataset loaded successfully: {:?}", data.shape());

    if args.dry_run {
        return run_dry_run(&args, &profiler, &data);
    }

    let report = match profiler.profile(&data) {
        Ok(report) => report,
        Err(e) => {
            error!("Profiling failed: {}", e);
            return Err(anyhow!("Profiling failed [{}]: {}", e.error_code(), e));
        }
    };

    if args.json {
        println!("{}", summary::to_json(&report.summaries)?);
        return Ok(());
    }

    let written = io::write_summaries(&args.output, &report.summaries)?;
    print_human_readable_summary(&report, &written);

    Ok(())
}

/// Read a configuration file, or use defaults when none is given.
fn load_config(path: Option<&Path>) -> Result<ProfilerConfig> {
    let Some(path) = path else {
        return Ok(ProfilerConfig::default());
    };

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: ProfilerConfig = serde_json::from_str(&content)
        .with_context(|| format!("Invalid config {}", path.display()))?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Dry-run mode: show what would be computed.
///
/// Uses `println!` on purpose: this output is the point of the flag and must
/// not depend on the log level.
fn run_dry_run(args: &Args, profiler: &ClusterProfiler, data: &DataFrame) -> Result<()> {
    let (table, plan) = profiler.prepare(data)?;

    println!("\n{}", "=".repeat(60));
    println!("DRY RUN - Preview of cluster profiling");
    println!("{}\n", "=".repeat(60));

    println!("DATASET OVERVIEW");
    println!("{}", "-".repeat(40));
    println!("  File: {}", args.input.display());
    println!("  Rows: {}", data.height());
    println!("  Columns: {}", data.width());
    println!();

    println!("CHANNELS");
    println!("{}", "-".repeat(40));
    for channel in table.channels() {
        println!("  - {:<20} ({:?})", channel.name, channel.kind);
    }
    println!();

    println!("INJECTED COLUMNS");
    println!("{}", "-".repeat(40));
    if table.injected().is_empty() {
        println!("  None");
    } else {
        for column in table.injected() {
            println!("  - {}", column);
        }
    }
    println!();

    println!("AGGREGATION PLAN");
    println!("{}", "-".repeat(40));
    for line in plan.to_string().lines() {
        println!("  {}", line);
    }
    println!();

    println!("{}", "=".repeat(60));
    println!("Would write: {}", args.output.display());
    println!("{}", "=".repeat(60));

    Ok(())
}

fn print_human_readable_summary(report: &ProfileReport, written: &Path) {
    println!();
    println!(
        "{:<8} {:<45} {:>6} {:>10}",
        "Cluster", "Label", "Size", "Conv. %"
    );
    println!("{}", "-".repeat(72));
    for summary in &report.summaries {
        println!(
            "{:<8} {:<45} {:>6} {:>9.1}%",
            summary.cluster,
            summary.label,
            summary.size,
            summary.conversion_rate * 100.0
        );
    }
    println!();
    println!("Saved cluster summaries -> {}", written.display());
    println!("Clusters summarized: {}", report.summaries.len());
}
