//! Topic-Trawl main entry point
//!
//! This is the command-line interface for the Topic-Trawl forum harvester.

use anyhow::Context;
use clap::Parser;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use topic_trawl::config::{load_config_with_hash, validate, validate_api_key, Config};
use topic_trawl::crawler::Coordinator;
use topic_trawl::output::print_statistics;
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Filter for the run log file, independent of `-v`/`-q`
const RUN_LOG_FILTER: &str = "topic_trawl=info,warn";

/// Topic-Trawl: a one-shot forum thread harvester
///
/// Topic-Trawl reads a forum's listing page, fetches every thread it links
/// to through a scraping backend, and writes titles, authors, dates, bodies,
/// tags and replies to a single JSON file.
#[derive(Parser, Debug)]
#[command(name = "topic-trawl")]
#[command(version)]
#[command(about = "A one-shot forum thread harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Forum root URL
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Path of the JSON artifact
    #[arg(short, long, value_name = "PATH")]
    output: Option<String>,

    /// Minimum seconds between the starts of two backend requests
    #[arg(long, value_name = "SECS")]
    min_delay: Option<f64>,

    /// Process at most this many threads
    #[arg(long, value_name = "N")]
    max_posts: Option<usize>,

    /// Path of the append-only run log
    #[arg(long, value_name = "PATH")]
    log_file: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Discover thread URLs and print them without extracting or writing anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // A missing .env file is fine; the key may come from the real environment
    let dotenv = dotenvy::dotenv();

    let (mut config, config_hash) = match &cli.config {
        Some(path) => {
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            (config, Some(hash))
        }
        None => (Config::default(), None),
    };

    apply_overrides(&mut config, &cli);
    validate(&config).context("Invalid configuration")?;

    setup_logging(&config.output.log_path, cli.verbose, cli.quiet)?;

    if let Ok(path) = dotenv {
        tracing::debug!("Loaded environment from {}", path.display());
    }
    match (&cli.config, &config_hash) {
        (Some(path), Some(hash)) => {
            tracing::info!("Configuration loaded from {} (hash: {})", path.display(), hash)
        }
        _ => tracing::info!("Using built-in configuration"),
    }

    let env_var = config.backend.api_key_env.clone();
    let api_key = match validate_api_key(std::env::var(&env_var).ok().as_deref(), &env_var) {
        Ok(key) => key,
        Err(e) => {
            tracing::error!("{}", e);
            return Err(e).context("Cannot start without a backend API key");
        }
    };

    let mut coordinator =
        Coordinator::from_config(config, api_key).context("Failed to set up the crawler")?;

    if cli.dry_run {
        handle_dry_run(&mut coordinator).await;
        return Ok(());
    }

    handle_crawl(&mut coordinator, cli.quiet).await
}

/// Applies command-line overrides on top of the file configuration
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(base_url) = &cli.base_url {
        config.forum.base_url = base_url.clone();
    }
    if let Some(output) = &cli.output {
        config.output.json_path = output.clone();
    }
    if let Some(min_delay) = cli.min_delay {
        config.crawler.min_delay_secs = min_delay;
    }
    if let Some(max_posts) = cli.max_posts {
        config.crawler.max_posts = Some(max_posts);
    }
    if let Some(log_file) = &cli.log_file {
        config.output.log_path = log_file.clone();
    }
}

/// Sets up the tracing subscriber: console output plus the run log file
fn setup_logging(log_path: &str, verbose: u8, quiet: bool) -> anyhow::Result<()> {
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("Failed to open log file {}", log_path))?;

    logging_subscriber(std::io::stdout, Mutex::new(log_file), verbose, quiet).init();

    Ok(())
}

/// Console verbosity from the -v/-q flags
fn console_filter(verbose: u8, quiet: bool) -> EnvFilter {
    if quiet {
        // Only show errors
        return EnvFilter::new("error");
    }

    match verbose {
        0 => EnvFilter::new("topic_trawl=info,warn"),
        1 => EnvFilter::new("topic_trawl=debug,info"),
        2 => EnvFilter::new("topic_trawl=trace,debug"),
        _ => EnvFilter::new("trace"),
    }
}

/// Builds the two-layer subscriber
///
/// The console layer follows the verbosity flags; the run log layer always
/// records at [`RUN_LOG_FILTER`].
fn logging_subscriber<C, F>(
    console: C,
    file: F,
    verbose: u8,
    quiet: bool,
) -> impl Subscriber + Send + Sync
where
    C: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    F: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_writer(console)
                .with_filter(console_filter(verbose, quiet)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(file)
                .with_filter(EnvFilter::new(RUN_LOG_FILTER)),
        )
}

/// Handles the --dry-run mode: discovers threads and lists them
async fn handle_dry_run(coordinator: &mut Coordinator) {
    println!("=== Topic-Trawl Dry Run ===\n");
    println!("Listing page: {}", coordinator.listing_url());

    let threads = coordinator.discover().await;

    println!("\nThreads ({}):", threads.len());
    for url in &threads {
        println!("  - {}", url);
    }
}

/// Handles the main crawl operation
async fn handle_crawl(coordinator: &mut Coordinator, quiet: bool) -> anyhow::Result<()> {
    let report = coordinator.run().await.context("Crawl failed")?;

    if !report.failures.is_empty() {
        tracing::warn!("{} threads were skipped:", report.failures.len());
        for failure in &report.failures {
            tracing::warn!("  {}", failure);
        }
    }

    if !quiet {
        println!();
        print_statistics(&report.stats);
    }

    Ok(())
}
