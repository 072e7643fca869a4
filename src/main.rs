//! Shelf-Sounder main entry point
//!
//! This is the command-line interface for the Shelf-Sounder product crawler.

use clap::Parser;
use shelf_sounder::config::{load_config_with_hash, Config};
use shelf_sounder::crawler::crawl;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Shelf-Sounder: a product crawler that sounds out cart limits
///
/// Shelf-Sounder discovers every product page on a storefront, extracts
/// product records, and probes the cart to find how many units of each
/// in-stock item can be bought. Records are appended to a CSV file.
#[derive(Parser, Debug)]
#[command(name = "shelf-sounder")]
#[command(version = "1.0.0")]
#[command(about = "A product crawler that sounds out cart limits", long_about = None)]
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

    /// Validate config and show the resolved settings without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
    } else {
        handle_crawl(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("shelf_sounder=info,warn"),
            1 => EnvFilter::new("shelf_sounder=debug,info"),
            2 => EnvFilter::new("shelf_sounder=trace,debug"),
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

/// Handles the --dry-run mode: prints the resolved configuration
fn handle_dry_run(config: &Config) {
    println!("=== Shelf-Sounder Dry Run ===\n");

    println!("Site:");
    println!("  Base URL: {}", config.site.base_url);
    println!("  Sitemap: {}", config.site.sitemap_url);
    println!("  Cart endpoint: {}", config.site.add_to_cart_url);
    println!("  Product page suffix: {}", config.site.page_suffix);

    println!("\nCrawler Configuration:");
    println!(
        "  Max concurrent requests: {}",
        config.crawler.max_concurrent_requests
    );
    println!("  Batch size: {}", config.crawler.batch_size);
    println!(
        "  Retries: {} (backoff {}ms)",
        config.crawler.max_retries, config.crawler.retry_backoff_ms
    );
    println!("  Max probed quantity: {}", config.crawler.max_quantity);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);

    println!("\nUser Agents ({}):", config.user_agent.agents.len());
    for agent in &config.user_agent.agents {
        println!("  - {}", agent);
    }

    println!("\nOutput:");
    println!("  Products: {}", config.output.products_path().display());
    println!("  Input list: {}", config.output.input_file);

    match &config.proxy {
        Some(proxy) => println!("\nProxy: {} ({})", proxy.endpoint, proxy.country),
        None => println!("\nProxy: none"),
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    match crawl(config).await {
        Ok(stats) => {
            tracing::info!(
                "Crawl completed successfully ({} records written)",
                stats.records_emitted
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
