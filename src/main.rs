//! job-crawl main entry point
//!
//! This is the command-line interface for generating and executing crawl jobs.

use anyhow::Context;
use clap::{ArgGroup, Parser};
use job_crawl::config::{load_config_with_hash, Config, SeedMode, StoreBackend};
use job_crawl::crawler;
use job_crawl::output::{load_statistics, print_statistics};
use job_crawl::queue::JobQueue;
use job_crawl::storage::{open_store, KvStore, MemoryStore};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// job-crawl: durable crawl jobs for job-posting sites
///
/// Generation walks listing pages and queues every detail page found;
/// execution fetches each queued page and stores its HTML.
#[derive(Parser, Debug)]
#[command(name = "job-crawl")]
#[command(version)]
#[command(about = "Generate and execute crawl jobs for job-posting sites", long_about = None)]
#[command(group(ArgGroup::new("action").required(true).multiple(true)))]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Walk listing pages and queue detail pages
    #[arg(short, long, group = "action")]
    generate: bool,

    /// Fetch queued pages and store their HTML
    #[arg(short, long, group = "action")]
    execute: bool,

    /// Validate config; with --generate, queue into memory only
    #[arg(long, group = "action", conflicts_with_all = ["execute", "stats"])]
    dry_run: bool,

    /// Show queue statistics
    #[arg(long, group = "action")]
    stats: bool,

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
    let (config, hash) = load_config_with_hash(&cli.config).map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.dry_run {
        print_dry_run(&config);
        if !cli.generate {
            return Ok(());
        }
    }

    let config = Arc::new(config);
    let store: Arc<dyn KvStore> = if cli.dry_run {
        Arc::new(MemoryStore::new())
    } else {
        open_store(&config.store)
            .await
            .context("Failed to open job store")?
    };
    let queue = Arc::new(JobQueue::new(store));

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    if cli.generate {
        let summary = crawler::generate(config.clone(), queue.clone(), cancel.clone())
            .await
            .context("Generation failed")?;
        println!(
            "Generated {} jobs from {}/{} listing pages ({} already known){}",
            summary.jobs_created,
            summary.seeds_processed,
            summary.seeds,
            summary.duplicates,
            if summary.cancelled { " [cancelled]" } else { "" }
        );
    }

    if cli.execute && !cancel.is_cancelled() {
        let summary = crawler::execute(config.clone(), queue.clone(), cancel.clone())
            .await
            .context("Execution failed")?;
        println!(
            "Executed {} jobs: {} succeeded, {} failed{}",
            summary.processed,
            summary.succeeded,
            summary.failed,
            if summary.cancelled { " [cancelled]" } else { "" }
        );
    }

    if cli.stats {
        let stats = load_statistics(&queue)
            .await
            .context("Failed to load queue statistics")?;
        print_statistics(&stats);
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
            0 => EnvFilter::new("job_crawl=info,warn"),
            1 => EnvFilter::new("job_crawl=debug,info"),
            2 => EnvFilter::new("job_crawl=trace,debug"),
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

/// Cancels `cancel` on Ctrl-C so in-flight work can wind down
fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received; finishing in-flight work");
            cancel.cancel();
        }
    });
}

/// Prints what a run with this configuration would do
fn print_dry_run(config: &Config) {
    let crawler = &config.crawler;

    println!("=== job-crawl Dry Run ===\n");

    println!("Crawler:");
    println!("  Base URL: {}", crawler.base_url);
    if let Some(detail_base) = &crawler.detail_base_url {
        println!("  Detail base URL: {}", detail_base);
    }
    println!("  Strategy: {}", crawler.strategy.as_str());
    println!(
        "  Timeout: {}s, retries: {}, concurrency: {}",
        crawler.timeout_seconds, crawler.retry_count, crawler.concurrency
    );
    println!(
        "  Batch size: {}, batch interval: {}s, sleep: {}s",
        crawler.batch_size, crawler.batch_interval_seconds, crawler.sleep_seconds
    );
    println!("  Output directory: {}", crawler.output_directory);

    println!("\nPagination:");
    println!("  Type: {}", config.pagination.kind.as_str());
    if let Some(ident) = config.pagination.identifier() {
        println!("  Identifier: {}", ident);
    }
    println!(
        "  Start: {}, per page: {}, max pages: {}",
        config.pagination.start, config.pagination.per_page, config.pagination.max_pages
    );

    println!("\nStore:");
    match config.store.backend {
        StoreBackend::Sqlite => println!(
            "  SQLite: {}",
            config.store.path.as_deref().unwrap_or_default()
        ),
        StoreBackend::Redis => println!("  Redis"),
    }

    println!("\nListing pages:");
    match crawler.seed_mode {
        SeedMode::Manual => {
            for url in &crawler.urls {
                println!("  - {}", url);
            }
        }
        SeedMode::Auto => println!(
            "  Discovered from {} via '{}'",
            crawler.base_url,
            config.selector.list_links.as_deref().unwrap_or_default()
        ),
    }

    println!("\n✓ Configuration is valid");
}
