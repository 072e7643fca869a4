use crate::config::types::{Config, CrawlerConfig, OutputConfig, ProxyConfig, SiteConfig};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_crawler_config(&config.crawler)?;
    validate_output_config(&config.output)?;

    if config.user_agent.agents.iter().all(|a| a.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "user-agent.agents must contain at least one non-empty agent".to_string(),
        ));
    }

    if let Some(proxy) = &config.proxy {
        validate_proxy_config(proxy)?;
    }

    Ok(())
}

/// Validates site endpoints and selectors
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("base-url", &config.base_url),
        ("sitemap-url", &config.sitemap_url),
        ("add-to-cart-url", &config.add_to_cart_url),
    ] {
        let url = Url::parse(value)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", name, value, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "{} '{}' must use HTTP or HTTPS",
                name, value
            )));
        }
    }

    if config.form_key.is_empty() {
        return Err(ConfigError::Validation(
            "form-key cannot be empty".to_string(),
        ));
    }

    if config.page_suffix.is_empty() {
        return Err(ConfigError::Validation(
            "page-suffix cannot be empty".to_string(),
        ));
    }

    if config.cart_success_marker.trim().is_empty() {
        return Err(ConfigError::Validation(
            "cart-success-marker cannot be empty".to_string(),
        ));
    }

    for (name, value) in [
        ("category-link-selector", &config.category_link_selector),
        ("listing-product-selector", &config.listing_product_selector),
        ("listing-next-selector", &config.listing_next_selector),
    ] {
        Selector::parse(value).map_err(|e| {
            ConfigError::Validation(format!("Invalid {} '{}': {:?}", name, value, e))
        })?;
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_requests < 1 || config.max_concurrent_requests > 64 {
        return Err(ConfigError::Validation(format!(
            "max-concurrent-requests must be between 1 and 64, got {}",
            config.max_concurrent_requests
        )));
    }

    if config.batch_size < 1 {
        return Err(ConfigError::Validation(format!(
            "batch-size must be >= 1, got {}",
            config.batch_size
        )));
    }

    if config.max_quantity < 1 {
        return Err(ConfigError::Validation(format!(
            "max-quantity must be >= 1, got {}",
            config.max_quantity
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request-timeout-secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.products_dir.is_empty() {
        return Err(ConfigError::Validation(
            "products-dir cannot be empty".to_string(),
        ));
    }

    if config.products_file.is_empty() {
        return Err(ConfigError::Validation(
            "products-file cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates proxy routing; a proxy table without a key is rejected
fn validate_proxy_config(config: &ProxyConfig) -> Result<(), ConfigError> {
    if config.api_key.is_empty() {
        return Err(ConfigError::Validation(
            "proxy.api-key cannot be empty when [proxy] is present".to_string(),
        ));
    }

    Url::parse(&config.endpoint).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid proxy endpoint '{}': {}", config.endpoint, e))
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> SiteConfig {
        toml::from_str(
            r#"
base-url = "https://shop.example.com"
sitemap-url = "https://shop.example.com/sitemap.xml"
add-to-cart-url = "https://shop.example.com/checkout/cart/add"
form-key = "abc123"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_validate_site_config() {
        assert!(validate_site_config(&site()).is_ok());

        let mut bad_url = site();
        bad_url.sitemap_url = "not a url".to_string();
        assert!(matches!(
            validate_site_config(&bad_url),
            Err(ConfigError::InvalidUrl(_))
        ));

        let mut ftp = site();
        ftp.base_url = "ftp://shop.example.com".to_string();
        assert!(validate_site_config(&ftp).is_err());

        let mut no_key = site();
        no_key.form_key.clear();
        assert!(validate_site_config(&no_key).is_err());

        let mut bad_selector = site();
        bad_selector.listing_next_selector = "a[[".to_string();
        assert!(validate_site_config(&bad_selector).is_err());
    }

    #[test]
    fn test_validate_crawler_config() {
        assert!(validate_crawler_config(&CrawlerConfig::default()).is_ok());

        let zero_quantity = CrawlerConfig {
            max_quantity: 0,
            ..CrawlerConfig::default()
        };
        assert!(validate_crawler_config(&zero_quantity).is_err());

        let no_workers = CrawlerConfig {
            max_concurrent_requests: 0,
            ..CrawlerConfig::default()
        };
        assert!(validate_crawler_config(&no_workers).is_err());
    }

    #[test]
    fn test_validate_proxy_config() {
        let mut proxy = ProxyConfig::default();
        assert!(validate_proxy_config(&proxy).is_err());

        proxy.api_key = "key".to_string();
        assert!(validate_proxy_config(&proxy).is_ok());

        proxy.endpoint = "::nope".to_string();
        assert!(validate_proxy_config(&proxy).is_err());
    }
}
