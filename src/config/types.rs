use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure for Shelf-Sounder
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub proxy: Option<ProxyConfig>,
}

/// The storefront being crawled
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Site root, also used as the input-list and category discovery target
    #[serde(rename = "base-url")]
    pub base_url: String,

    #[serde(rename = "sitemap-url")]
    pub sitemap_url: String,

    /// Cart side-effect endpoint used for quantity probing
    #[serde(rename = "add-to-cart-url")]
    pub add_to_cart_url: String,

    /// Form key sent both as a form field and as a cookie
    #[serde(rename = "form-key")]
    pub form_key: String,

    /// Suffix every product page URL must end with
    #[serde(rename = "page-suffix", default = "default_page_suffix")]
    pub page_suffix: String,

    /// Case-insensitive marker in the cart response body meaning "accepted"
    #[serde(rename = "cart-success-marker", default = "default_success_marker")]
    pub cart_success_marker: String,

    #[serde(rename = "category-link-selector", default = "default_category_selector")]
    pub category_link_selector: String,

    #[serde(rename = "listing-product-selector", default = "default_listing_product_selector")]
    pub listing_product_selector: String,

    #[serde(rename = "listing-next-selector", default = "default_listing_next_selector")]
    pub listing_next_selector: String,
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of requests in flight
    #[serde(rename = "max-concurrent-requests", default = "default_concurrency")]
    pub max_concurrent_requests: u32,

    /// How many frontier entries are popped per dispatch point
    #[serde(rename = "batch-size", default = "default_batch_size")]
    pub batch_size: usize,

    /// Resubmissions allowed for a failing request before it is dropped
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Fixed delay before a retry is resubmitted (milliseconds)
    #[serde(rename = "retry-backoff-ms", default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Exclusive ceiling for the cart quantity search
    #[serde(rename = "max-quantity", default = "default_max_quantity")]
    pub max_quantity: u32,

    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: default_concurrency(),
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            max_quantity: default_max_quantity(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// User agents rotated across outgoing requests
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    #[serde(default = "default_agents")]
    pub agents: Vec<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            agents: default_agents(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory the products CSV is written to (overridden by `PRODUCTS_FILE_DIR`)
    #[serde(rename = "products-dir")]
    pub products_dir: String,

    #[serde(rename = "products-file", default = "default_products_file")]
    pub products_file: String,

    /// CSV of product URLs to crawl in addition to the sitemap
    #[serde(rename = "input-file", default = "default_input_file")]
    pub input_file: String,
}

impl OutputConfig {
    /// Full path of the products CSV
    pub fn products_path(&self) -> PathBuf {
        PathBuf::from(&self.products_dir).join(&self.products_file)
    }
}

/// Proxy API routing (overridden by `SCRAPEOPS_API_KEY`)
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyConfig {
    #[serde(rename = "api-key", default)]
    pub api_key: String,

    #[serde(default = "default_proxy_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_proxy_country")]
    pub country: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: default_proxy_endpoint(),
            country: default_proxy_country(),
        }
    }
}

fn default_page_suffix() -> String {
    ".html".to_string()
}

fn default_success_marker() -> String {
    "successfully added to cart.".to_string()
}

fn default_category_selector() -> String {
    "nav.navigation li.level0 > a[href]".to_string()
}

fn default_listing_product_selector() -> String {
    "a.product-item-link[href]".to_string()
}

fn default_listing_next_selector() -> String {
    "a.action.next[href]".to_string()
}

fn default_concurrency() -> u32 {
    4
}

fn default_batch_size() -> usize {
    4
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    2000
}

fn default_max_quantity() -> u32 {
    1000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_agents() -> Vec<String> {
    vec![
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/109.0.0.0 Safari/537.36".to_string(),
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/109.0.0.0 Safari/537.36".to_string(),
        "Mozilla/5.0 (X11; Linux x86_64; rv:109.0) Gecko/20100101 Firefox/115.0".to_string(),
    ]
}

fn default_products_file() -> String {
    "products.csv".to_string()
}

fn default_input_file() -> String {
    "input/input_product_urls.csv".to_string()
}

fn default_proxy_endpoint() -> String {
    "https://proxy.scrapeops.io/v1/".to_string()
}

fn default_proxy_country() -> String {
    "us".to_string()
}
