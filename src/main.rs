//! SEO Crawler main entry point
//!
//! This is the command-line interface for the technical SEO crawler.

use anyhow::{bail, Context};
use clap::Parser;
use seo_crawler::config::{load_config_with_hash, Config};
use seo_crawler::output::{export_snapshot, load_statistics, print_statistics, stats::print_run};
use seo_crawler::storage::{self, SqliteStorage, Storage};
use seo_crawler::Coordinator;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const STATUS_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// SEO Crawler: a frontier-bounded technical SEO crawler
///
/// Crawls one site breadth-first up to a page budget, records technical SEO
/// signals for every page, and exports them as JSON for the reporting stage.
#[derive(Parser, Debug)]
#[command(name = "seo-crawler")]
#[command(version = "1.0.0")]
#[command(about = "A frontier-bounded technical SEO crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Seed URL to crawl (must start with http:// or https://)
    #[arg(long, value_name = "URL", required_unless_present_any = ["export", "clear", "stats", "status"])]
    url: Option<String>,

    /// Page budget for this crawl (overrides max-pages from the config)
    #[arg(long, value_name = "N")]
    max_pages: Option<usize>,

    /// Clear stored records before crawling
    #[arg(long, requires = "url")]
    fresh: bool,

    /// Export the stored records as JSON and exit
    #[arg(long, conflicts_with_all = ["url", "clear", "stats", "status"])]
    export: bool,

    /// Delete every stored record and exit
    #[arg(long, conflicts_with_all = ["url", "export", "stats", "status"])]
    clear: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["url", "export", "clear", "status"])]
    stats: bool,

    /// Show the latest crawl run and exit
    #[arg(long, conflicts_with_all = ["url", "export", "clear", "stats"])]
    status: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.export {
        handle_export(&config)
    } else if cli.clear {
        handle_clear(&config)
    } else if cli.stats {
        handle_stats(&config)
    } else if cli.status {
        handle_status(&config)
    } else {
        let Some(url) = cli.url.as_deref() else {
            bail!("--url is required to start a crawl");
        };
        let budget = cli.max_pages.unwrap_or(config.crawler.max_pages);
        handle_crawl(config, config_hash, url, budget, cli.fresh).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("seo_crawler=info,warn"),
            1 => EnvFilter::new("seo_crawler=debug,info"),
            2 => EnvFilter::new("seo_crawler=trace,debug"),
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

fn open_storage(config: &Config) -> anyhow::Result<SqliteStorage> {
    let path = Path::new(&config.output.database_path);
    storage::open_storage(path).with_context(|| format!("Failed to open database {}", path.display()))
}

/// Handles the --export mode: writes the JSON snapshot
fn handle_export(config: &Config) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    let path = Path::new(&config.output.export_path);
    let count = export_snapshot(&storage, path)
        .with_context(|| format!("Failed to export to {}", path.display()))?;

    println!("Exported {} pages to: {}", count, path.display());
    Ok(())
}

/// Handles the --clear mode: deletes every stored record
fn handle_clear(config: &Config) -> anyhow::Result<()> {
    let mut storage = open_storage(config)?;
    let removed = storage.clear_all().context("Failed to clear records")?;

    println!("Removed {} records from {}", removed, config.output.database_path);
    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(config)?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --status mode: shows the latest run, including in-flight progress
fn handle_status(config: &Config) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    match storage.get_latest_run()? {
        Some(run) => print_run(&run),
        None => println!("No crawl runs recorded"),
    }
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: Config,
    config_hash: String,
    url: &str,
    budget: usize,
    fresh: bool,
) -> anyhow::Result<()> {
    let export_path = PathBuf::from(&config.output.export_path);
    let coordinator = Arc::new(Coordinator::open(config, config_hash)?);

    if fresh {
        tracing::info!("Starting fresh crawl (clearing stored records)");
        coordinator.clear_records()?;
    }

    let handle = Arc::clone(&coordinator)
        .spawn(url, budget)
        .with_context(|| format!("Cannot crawl {}", url))?;

    let mut last_processed = None;
    while !handle.is_finished() {
        tokio::select! {
            _ = tokio::time::sleep(STATUS_POLL_INTERVAL) => {}
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl-C")?;
                coordinator.interrupt()?;
                bail!("Crawl interrupted");
            }
        }
        let report = handle.status();
        if last_processed != Some(report.pages_processed) {
            println!(
                "[{}] {}/{} pages processed, {} persisted",
                report.status, report.pages_processed, report.pages_budgeted, report.pages_persisted
            );
            last_processed = Some(report.pages_processed);
        }
    }

    let report = handle.status();
    let persisted = handle.wait().await.context("Crawl failed")?;
    println!(
        "Crawl {}: {} of {} pages persisted from {}",
        report.status, persisted, report.pages_processed, report.url
    );

    let storage = coordinator.storage();
    let guard = storage
        .lock()
        .map_err(|_| anyhow::anyhow!("Storage lock poisoned"))?;
    let count = export_snapshot(&*guard, &export_path)?;
    println!("Exported {} pages to: {}", count, export_path.display());

    Ok(())
}
