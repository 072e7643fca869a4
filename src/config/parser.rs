use crate::config::types::{Config, ProxyConfig};
use crate::config::validation::validate;
use crate::ConfigResult;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Environment variable overriding `output.products-dir`
pub const PRODUCTS_DIR_ENV: &str = "PRODUCTS_FILE_DIR";

/// Environment variable overriding `proxy.api-key`
pub const PROXY_KEY_ENV: &str = "SCRAPEOPS_API_KEY";

/// Loads and parses a configuration file from the given path
///
/// Environment overrides are applied before validation, so a file without a
/// `[proxy]` table still gets proxy routing when `SCRAPEOPS_API_KEY` is set.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path)?;

    let mut config: Config = toml::from_str(&content)?;
    apply_env_overrides(&mut config);

    validate(&config)?;

    Ok(config)
}

/// Applies `PRODUCTS_FILE_DIR` and `SCRAPEOPS_API_KEY` from the process environment
pub fn apply_env_overrides(config: &mut Config) {
    apply_overrides(config, |key| std::env::var(key).ok());
}

/// Applies overrides from an arbitrary lookup; empty values are ignored
pub fn apply_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(dir) = lookup(PRODUCTS_DIR_ENV) {
        tracing::debug!("Products directory overridden from environment: {}", dir);
        config.output.products_dir = dir;
    }

    if let Some(key) = lookup(PROXY_KEY_ENV) {
        config.proxy.get_or_insert_with(ProxyConfig::default).api_key = key;
    }
}

/// Computes a SHA-256 hash of the configuration file content
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> ConfigResult<String> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> ConfigResult<(Config, String)> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
