//! Configuration module for Shelf-Sounder
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! then layering the environment overrides on top.
//!
//! # Example
//!
//! ```no_run
//! use shelf_sounder::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sounder.toml")).unwrap();
//! println!("Probing up to {} units", config.crawler.max_quantity);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, ProxyConfig, SiteConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{
    apply_env_overrides, apply_overrides, compute_config_hash, load_config, load_config_with_hash,
    PRODUCTS_DIR_ENV, PROXY_KEY_ENV,
};
