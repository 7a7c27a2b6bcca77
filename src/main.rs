//! Image-Finder main entry point
//!
//! This is the command-line interface for the Image-Finder asset harvester.

use anyhow::{bail, Context, Result};
use clap::Parser;
use image_finder::config::{load_config_with_hash, validate, Config};
use image_finder::output::{log_summary, write_json, CrawlSummary};
use image_finder::{AiBackends, Crawler, Enricher, ImageFinderError};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Upper bound on the asset budget accepted from the command line
const MAX_ASSETS_CEILING: usize = 100;

/// Image-Finder: a same-site visual asset harvester
///
/// Image-Finder crawls a website breadth-first from a start URL, collecting
/// favicons, logos and images until the asset budget is spent, and can
/// enrich them with object detection and OCR.
#[derive(Parser, Debug)]
#[command(name = "image-finder")]
#[command(version)]
#[command(about = "A same-site visual asset harvester", long_about = None)]
struct Cli {
    /// Start URL of the crawl
    #[arg(value_name = "URL")]
    url: String,

    /// Asset budget for the crawl (at most 100)
    #[arg(long, default_value_t = 10)]
    max_assets: usize,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Run object detection and OCR on the harvested assets
    #[arg(long)]
    enrich: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = load_configuration(cli.config.as_ref())?;
    let max_assets = cli.max_assets.min(MAX_ASSETS_CEILING);
    if max_assets < cli.max_assets {
        tracing::warn!(
            "--max-assets {} clamped to {}",
            cli.max_assets,
            MAX_ASSETS_CEILING
        );
    }

    if cli.dry_run {
        handle_dry_run(&config, &cli.url, max_assets, cli.enrich);
        return Ok(());
    }

    handle_crawl(config, &cli.url, max_assets, cli.enrich).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr; stdout carries only the JSON results.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("image_finder=info,warn"),
            1 => EnvFilter::new("image_finder=debug,info"),
            2 => EnvFilter::new("image_finder=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the config file when given, otherwise the validated defaults
fn load_configuration(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Ok(config)
        }
        None => {
            let config = Config::default();
            validate(&config).context("Default configuration is invalid")?;
            Ok(config)
        }
    }
}

/// Handles the --dry-run mode: shows the effective settings
fn handle_dry_run(config: &Config, url: &str, max_assets: usize, enrich: bool) {
    println!("=== Image-Finder Dry Run ===\n");

    println!("Crawl:");
    println!("  Start URL: {}", url);
    println!("  Asset budget: {}", max_assets);
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Workers: {}", config.crawler.workers);
    println!(
        "  Politeness delay: {}..={}ms",
        config.crawler.min_delay_ms, config.crawler.max_delay_ms
    );
    println!("  User agent: {}", config.crawler.user_agent);

    println!("\nEnrichment: {}", if enrich { "enabled" } else { "disabled" });
    if enrich {
        println!("  Timeout: {}s", config.enrichment.timeout_secs);
        println!("  Max concurrent: {}", config.enrichment.max_concurrent);
        println!(
            "  Detector: {}",
            config
                .enrichment
                .detector_endpoint
                .as_deref()
                .unwrap_or("(not configured)")
        );
        println!("  OCR: {}", config.enrichment.ocr_endpoint);
        println!(
            "  Rasterizer: {}",
            config
                .enrichment
                .rasterizer_endpoint
                .as_deref()
                .unwrap_or("(not configured)")
        );
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, url: &str, max_assets: usize, enrich: bool) -> Result<()> {
    // Build backends before crawling so a bad enrichment setup fails fast
    let enricher = if enrich {
        let backends = AiBackends::from_config(&config.enrichment)
            .context("Failed to set up enrichment backends")?;
        Some(Enricher::new(backends, &config.enrichment))
    } else {
        None
    };

    let crawler =
        Crawler::from_config(config.crawler).context("Failed to build the HTTP client")?;

    let mut pages = match crawler.crawl(url, max_assets).await {
        Ok(pages) => pages,
        Err(ImageFinderError::InvalidUrl { url, reason }) => {
            tracing::error!("Rejected start URL {}: {}", url, reason);
            bail!("URL is malformed");
        }
        Err(e) => return Err(e).context("Crawl failed"),
    };

    if let Some(enricher) = &enricher {
        tracing::info!("Enriching {} page(s)", pages.len());
        enricher.enrich_all(&mut pages).await;
    }

    log_summary(&CrawlSummary::from_pages(&pages));

    let stdout = std::io::stdout();
    write_json(&mut stdout.lock(), &pages).context("Failed to write results")?;

    Ok(())
}
