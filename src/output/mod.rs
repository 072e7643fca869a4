//! Output module for finished records and crawl statistics
//!
//! This module handles:
//! - The append-only record sink interface
//! - Writing records to the products CSV
//! - Recording and printing crawl statistics

mod csv_sink;
pub mod stats;
mod traits;

pub use csv_sink::CsvSink;
pub use stats::{print_statistics, CrawlStatistics};
pub use traits::{OutputError, OutputResult, RecordSink};
