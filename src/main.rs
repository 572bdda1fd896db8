//! Sumi-Search main entry point
//!
//! This is the command-line interface for the Sumi-Search site search engine.

use anyhow::{bail, Context};
use clap::Parser;
use std::path::PathBuf;
use sumi_search::config::{load_config, Config};
use sumi_search::output::{print_search_results, print_statistics};
use sumi_search::SearchEngine;
use tracing_subscriber::EnvFilter;

/// Sumi-Search: a lemma-indexing site search engine
///
/// Sumi-Search crawls the configured websites, indexes the visible text of
/// every page by dictionary form, and answers ranked full-text queries with
/// highlighted snippets.
#[derive(Parser, Debug)]
#[command(name = "sumi-search")]
#[command(version = "1.0.0")]
#[command(about = "A lemma-indexing site search engine", long_about = None)]
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

    /// Purge every site's pages before crawling
    #[arg(long, conflicts_with_all = ["stats", "search", "index_page"])]
    fresh: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["search", "index_page"])]
    stats: bool,

    /// Run a search query and exit
    #[arg(long, value_name = "QUERY", conflicts_with = "index_page")]
    search: Option<String>,

    /// Restrict the search to one site (root URL)
    #[arg(long, value_name = "URL", requires = "search")]
    site: Option<String>,

    /// Number of results to skip
    #[arg(long, default_value_t = 0)]
    offset: usize,

    /// Maximum number of results (0 uses the configured default)
    #[arg(long, default_value_t = 0)]
    limit: usize,

    /// Fetch and re-index a single page, then exit
    #[arg(long, value_name = "URL")]
    index_page: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let mut config = load_config(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    config.crawler.fresh_start |= cli.fresh;

    if cli.stats {
        handle_stats(config)
    } else if let Some(query) = &cli.search {
        handle_search(config, query, cli.site.as_deref(), cli.offset, cli.limit)
    } else if let Some(url) = &cli.index_page {
        handle_index_page(config, url).await
    } else {
        handle_crawl(config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_search=info,warn"),
            1 => EnvFilter::new("sumi_search=debug,info"),
            2 => EnvFilter::new("sumi_search=trace,debug"),
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

fn open_engine(config: Config) -> anyhow::Result<SearchEngine> {
    let database = config.storage.database_path.clone();
    SearchEngine::new(config).with_context(|| format!("Failed to open database {}", database))
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.storage.database_path);

    let engine = open_engine(config)?;
    let stats = engine.statistics().context("Failed to load statistics")?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --search mode: prints one page of ranked results
fn handle_search(
    config: Config,
    query: &str,
    site: Option<&str>,
    offset: usize,
    limit: usize,
) -> anyhow::Result<()> {
    let engine = open_engine(config)?;
    let results = engine
        .search(query, site, offset, limit)
        .with_context(|| format!("Search for \"{}\" failed", query))?;
    print_search_results(query, offset, &results);

    Ok(())
}

/// Handles the --index-page mode: re-indexes a single page
async fn handle_index_page(config: Config, url: &str) -> anyhow::Result<()> {
    let engine = open_engine(config)?;

    if !engine.index_page(url).await {
        bail!("Page {} was not indexed", url);
    }
    println!("✓ Indexed {}", url);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    if config.crawler.fresh_start {
        tracing::info!("Starting fresh crawl (purging previously indexed pages)");
    }
    tracing::info!("Configured sites: {}", config.sites.len());

    let engine = open_engine(config)?;
    if !engine.start_indexing() {
        bail!("Indexing could not be started");
    }

    tokio::select! {
        _ = engine.wait_for_indexing() => {
            tracing::info!("Indexing finished");
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl-C")?;
            tracing::info!("Interrupt received, stopping indexing");
            engine.stop_indexing();
            engine.wait_for_indexing().await;
        }
    }

    let stats = engine.statistics().context("Failed to load statistics")?;
    print_statistics(&stats);

    Ok(())
}
