//! Crawl statistics
//!
//! Counters updated by the coordinator as responses are handled, and a
//! summary printed when the crawl finishes.

use std::time::Duration;

/// Counters for one crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// Responses that reached a handler
    pub responses_handled: u64,

    /// Product pages that yielded a structured payload
    pub pages_parsed: u64,

    /// Records handed to the sink
    pub records_emitted: u64,
    pub records_in_stock: u64,
    pub records_out_of_stock: u64,

    /// Cart responses folded into a probe
    pub probes_answered: u64,

    pub retries: u64,
    pub dropped: u64,
    pub not_found: u64,

    /// Product pages whose payload was missing or malformed
    pub extraction_errors: u64,
    pub skipped_variants: u64,

    /// Requests rejected by the dispatch dedup filter
    pub filtered_duplicates: u64,

    pub sink_errors: u64,
}

impl CrawlStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Share of handled product pages that produced records, as a percentage
    pub fn extraction_rate(&self) -> f64 {
        let attempted = self.pages_parsed + self.extraction_errors;
        if attempted == 0 {
            return 0.0;
        }
        (self.pages_parsed as f64 / attempted as f64) * 100.0
    }
}

/// Logs the statistics at info level
///
/// # Arguments
///
/// * `stats` - The statistics to display
/// * `elapsed` - Wall time of the crawl
pub fn print_statistics(stats: &CrawlStatistics, elapsed: Duration) {
    tracing::info!("=== Crawl Statistics ===");
    tracing::info!(
        "Responses handled: {} in {:.1}s",
        stats.responses_handled,
        elapsed.as_secs_f64()
    );
    tracing::info!(
        "Records emitted: {} ({} in stock, {} out of stock)",
        stats.records_emitted,
        stats.records_in_stock,
        stats.records_out_of_stock
    );
    tracing::info!(
        "Product pages parsed: {} ({:.1}% of attempted), variants skipped: {}",
        stats.pages_parsed,
        stats.extraction_rate(),
        stats.skipped_variants
    );
    tracing::info!("Cart probes answered: {}", stats.probes_answered);
    tracing::info!(
        "Retries: {}, dropped: {}, not found: {}, duplicates filtered: {}",
        stats.retries,
        stats.dropped,
        stats.not_found,
        stats.filtered_duplicates
    );

    if stats.sink_errors > 0 {
        tracing::warn!("{} records could not be written", stats.sink_errors);
    }
}
