//! Sitemapper main entry point
//!
//! This is the command-line interface for the Sitemapper site mapper.

use anyhow::Context;
use clap::Parser;
use sitemapper::config::{load_config, validate, Config};
use sitemapper::SiteMap;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Sitemapper: a concurrent site mapper
///
/// Sitemapper crawls every page of a web site reachable from a starting
/// URL, following only links that stay on the same host, and prints the
/// pages as a tree of titles.
#[derive(Parser, Debug)]
#[command(name = "sitemapper")]
#[command(version)]
#[command(about = "A concurrent site mapper", long_about = None)]
struct Cli {
    /// Absolute HTTP(S) URL the crawl starts from
    #[arg(value_name = "START_URL")]
    start_url: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Number of pages fetched and scanned concurrently
    #[arg(short, long)]
    workers: Option<usize>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?
        }
        None => Config::default(),
    };

    if let Some(workers) = cli.workers {
        config.crawler.workers = workers;
        validate(&config).context("Invalid --workers value")?;
    }

    tracing::info!(
        "Mapping {} with {} workers",
        cli.start_url,
        config.crawler.workers
    );

    let mut sitemap = SiteMap::new(config);
    let stats = sitemap
        .produce_from(&cli.start_url)
        .with_context(|| format!("Failed to map {}", cli.start_url))?;

    if stats.failed > 0 {
        tracing::warn!(
            "{} of {} pages could not be fetched",
            stats.failed,
            stats.completed
        );
        for record in sitemap.records().filter(|r| r.is_failed()) {
            tracing::debug!(
                "Could not fetch {}: {}",
                record.id,
                record.failure.as_deref().unwrap_or_default()
            );
        }
    }

    sitemap.print().context("Failed to write site map")?;

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so that stdout carries only the site map.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitemapper=info,warn"),
            1 => EnvFilter::new("sitemapper=debug,info"),
            2 => EnvFilter::new("sitemapper=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
