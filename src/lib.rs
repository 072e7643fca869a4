//! Shelf-Sounder: a product crawler that sounds out cart limits
//!
//! This crate discovers product pages on a single storefront, extracts
//! structured product records, and for in-stock items binary-searches the
//! cart endpoint to find the largest quantity the store will accept.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod state;

use thiserror::Error;

/// Main error type for Shelf-Sounder operations
#[derive(Debug, Error)]
pub enum SounderError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors raised while turning a product page into records
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("No structured product data found on page")]
    MissingProductData,

    #[error("Malformed product payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Product payload is missing `{0}`")]
    MissingField(&'static str),
}

/// Result type alias for Shelf-Sounder operations
pub type Result<T> = std::result::Result<T, SounderError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for extraction operations
pub type ExtractResult<T> = std::result::Result<T, ExtractError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, HttpTransport, Transport};
pub use extract::clean;
pub use state::{ProbeState, ProductRecord};
