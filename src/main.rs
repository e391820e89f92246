//! Exam-Harvest main entry point
//!
//! This is the command-line interface for the exam question harvester.

use anyhow::Context;
use clap::Parser;
use exam_harvest::config::{load_config_with_hash, Config};
use exam_harvest::crawler::{run_harvest, HarvestOptions};
use exam_harvest::output::{print_report, report_from_checkpoint};
use exam_harvest::remote::HttpCatalogClient;
use exam_harvest::storage::open_checkpoints;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Exam-Harvest: a resumable exam question collector
///
/// Exam-Harvest walks the catalog API year by year and page by page for
/// every subject of an exam, deduplicates the questions it finds, and
/// checkpoints its progress so an interrupted run can pick up where it
/// stopped.
#[derive(Parser, Debug)]
#[command(name = "exam-harvest")]
#[command(version)]
#[command(about = "A resumable exam question collector", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Start a fresh harvest, ignoring any checkpoint
    #[arg(long)]
    fresh: bool,

    /// Override the exam named in the config file
    #[arg(long, value_name = "NAME", value_parser = clap::builder::NonEmptyStringValueParser::new())]
    exam: Option<String>,

    /// Validate config and show what would be harvested without calling the API
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the checkpoint and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config).with_context(|| {
        format!(
            "Failed to load configuration from {}",
            cli.config.display()
        )
    })?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Some(exam) = cli.exam {
        tracing::info!("Exam overridden on the command line: {}", exam);
        config.collection.exam = exam;
    }

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config, &config_hash);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_harvest(config, config_hash, cli.fresh).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("exam_harvest=info,warn"),
            1 => EnvFilter::new("exam_harvest=debug,info"),
            2 => EnvFilter::new("exam_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config, config_hash: &str) {
    let collection = &config.collection;

    println!("=== Exam-Harvest Dry Run ===\n");

    println!("API:");
    println!("  Endpoint: {}", config.api.base_url);
    println!("  Credential: configured");
    println!("  Connect timeout: {}s", config.api.connect_timeout_secs);

    println!("\nCollection:");
    println!("  Exam: {}", collection.exam);
    match (collection.per_subject_target, collection.target) {
        (Some(per_subject), _) => println!("  Per-subject target: {}", per_subject),
        (None, Some(target)) => println!("  Global target: {} (split across subjects)", target),
        (None, None) => println!("  Target: none"),
    }
    println!("  Polite delay: {}ms", collection.polite_delay_ms);
    println!("  Variant delay: {}ms", collection.variant_delay_ms);
    println!("  Checkpoint every: {} pages", collection.checkpoint_pages);
    println!("  Max pages per round: {}", collection.max_pages_per_round);
    println!("  Honor pagination: {}", collection.honor_pagination);
    if let Some(years_back) = collection.years_back {
        println!("  Years back: {}", years_back);
    }

    match &collection.years {
        Some(years) => println!("\nYears ({}): {}", years.len(), years.join(", ")),
        None => println!(
            "\nYears: discovered (fallback {}..{})",
            collection.fallback_years.first().map(String::as_str).unwrap_or("-"),
            collection.fallback_years.last().map(String::as_str).unwrap_or("-")
        ),
    }
    match &collection.subjects {
        Some(subjects) => println!("Subjects ({}): {}", subjects.len(), subjects.join(", ")),
        None => println!(
            "Subjects: discovered (fallback {})",
            collection.fallback_subjects.join(", ")
        ),
    }

    println!("\nRetry:");
    println!("  Max attempts: {}", config.retry.max_attempts);
    println!("  Backoff step: {}ms", config.retry.backoff_step_ms);

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);
    println!("  Checkpoint: {}", config.checkpoint_path());

    println!("\n✓ Configuration is valid (hash: {})", config_hash);
}

/// Handles the --stats mode: shows statistics from the checkpoint
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let path = config.checkpoint_path();
    println!("Checkpoint: {}\n", path);

    let checkpoint = open_checkpoints(Path::new(&path))
        .try_load()
        .with_context(|| format!("Failed to read checkpoint {}", path))?;

    match checkpoint {
        Some(checkpoint) => print_report(&report_from_checkpoint(&checkpoint)),
        None => println!("No checkpoint found for {}", config.collection.exam),
    }

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(config: Config, config_hash: String, fresh: bool) -> anyhow::Result<()> {
    if fresh {
        tracing::info!("Starting fresh harvest (ignoring previous checkpoint)");
    } else {
        tracing::info!("Starting harvest (will resume from checkpoint if present)");
    }

    let client = HttpCatalogClient::from_config(&config).context("Failed to build API client")?;
    let options = HarvestOptions {
        fresh,
        config_hash: Some(config_hash),
    };

    let outcome = run_harvest(&config, Arc::new(client), options)
        .await
        .with_context(|| format!("Harvest of {} failed", config.collection.exam))?;

    tracing::info!(
        "Finished. Collected {} unique questions for {}",
        outcome.report.total_records,
        outcome.report.exam
    );
    tracing::info!("Outputs written to {}", outcome.files.directory.display());

    print_report(&outcome.report);
    Ok(())
}
