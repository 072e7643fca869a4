//! Crawler module for product discovery and stock probing
//!
//! This module contains the core crawling logic, including:
//! - HTTP transport with user agent rotation and optional proxying
//! - Per-branch frontiers and the seen-URL set
//! - Retry classification around every handler
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod frontier;
mod request;
mod retry;
mod seeds;

pub use coordinator::{today_date, Coordinator};
pub use fetcher::{build_http_client, HttpTransport, Transport};
pub use frontier::{Frontier, SeenUrls};
pub use request::{
    Dispatch, Fetched, Method, RequestContext, RequestDescriptor, RequestKind, ResponseDescriptor,
};
pub use retry::{Disposition, Guarded, RetryPolicy};
pub use seeds::{load_input_urls, normalize_candidate};

use crate::config::Config;
use crate::output::{CrawlStatistics, CsvSink};
use crate::Result;
use std::path::Path;
use std::sync::Arc;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Load the local input list
/// 2. Build the HTTP transport
/// 3. Open the products CSV
/// 4. Run discovery, extraction and probing until no work remains
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Crawl completed
/// * `Err(SounderError)` - Crawl could not start or its output failed
pub async fn crawl(config: Config) -> Result<CrawlStatistics> {
    let input_urls = load_input_urls(Path::new(&config.output.input_file))?;
    let transport = HttpTransport::new(&config)?;
    let sink = CsvSink::open(&config.output.products_path())?;
    tracing::info!("Writing products to {}", sink.path().display());

    let mut coordinator = Coordinator::new(config, Arc::new(transport), Box::new(sink))
        .with_input_urls(input_urls);

    coordinator.run().await
}
