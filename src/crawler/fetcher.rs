//! HTTP transport implementation
//!
//! This module handles all HTTP traffic for the crawler, including:
//! - Building HTTP clients with browser-like default headers
//! - Rotating user agents across requests
//! - Cart-add POSTs with the form key cookie and referer
//! - Optional routing through a proxy API

use crate::config::{Config, CrawlerConfig, ProxyConfig};
use crate::crawler::request::{Fetched, Method, RequestDescriptor};
use crate::SounderError;
use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Client;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use url::Url;

/// Capability to submit a request and receive its response
///
/// Concurrency, pacing and retries live outside the transport; an
/// implementation only performs a single exchange.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn submit(&self, request: &RequestDescriptor) -> Result<Fetched, SounderError>;
}

/// Builds an HTTP client with the crawler's default headers
///
/// # Arguments
///
/// * `config` - The crawler configuration (for the request timeout)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-GB,en-US;q=0.9,en;q=0.8"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));

    Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// `Transport` backed by reqwest
pub struct HttpTransport {
    client: Client,
    agents: Vec<String>,
    next_agent: AtomicUsize,
    form_key: String,
    proxy: Option<ProxyConfig>,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self, SounderError> {
        let agents = config
            .user_agent
            .agents
            .iter()
            .filter(|a| !a.trim().is_empty())
            .cloned()
            .collect();

        Ok(Self {
            client: build_http_client(&config.crawler)?,
            agents,
            next_agent: AtomicUsize::new(0),
            form_key: config.site.form_key.clone(),
            proxy: config.proxy.clone(),
        })
    }

    /// Round-robin user agent
    fn user_agent(&self) -> Option<&str> {
        if self.agents.is_empty() {
            return None;
        }
        let i = self.next_agent.fetch_add(1, Ordering::Relaxed) % self.agents.len();
        Some(self.agents[i].as_str())
    }

    /// The URL actually contacted, rewritten through the proxy API if configured
    pub fn target_url(&self, url: &str) -> Result<String, SounderError> {
        match &self.proxy {
            Some(proxy) => proxied_url(proxy, url),
            None => Ok(url.to_string()),
        }
    }
}

/// Wraps `url` in a proxy API call
fn proxied_url(proxy: &ProxyConfig, url: &str) -> Result<String, SounderError> {
    let wrapped = Url::parse_with_params(
        &proxy.endpoint,
        &[
            ("api_key", proxy.api_key.as_str()),
            ("url", url),
            ("country", proxy.country.as_str()),
            ("keep_headers", "true"),
        ],
    )?;
    Ok(wrapped.into())
}

#[async_trait]
impl Transport for HttpTransport {
    async fn submit(&self, request: &RequestDescriptor) -> Result<Fetched, SounderError> {
        let target = self.target_url(&request.url)?;

        let mut builder = match request.method() {
            Method::Get => self.client.get(&target),
            Method::Post => self
                .client
                .post(&target)
                .header(header::COOKIE, format!("form_key={}", self.form_key))
                .form(&request.form),
        };

        if let Some(agent) = self.user_agent() {
            builder = builder.header(header::USER_AGENT, agent);
        }
        if let Some(referer) = &request.referer {
            builder = builder.header(header::REFERER, referer.as_str());
        }

        let http_error = |source| SounderError::Http {
            url: request.url.clone(),
            source,
        };

        let response = builder.send().await.map_err(http_error)?;
        let status = response.status().as_u16();
        // Through the proxy the final URL is the proxy endpoint, not the page.
        let url = match self.proxy {
            Some(_) => request.url.clone(),
            None => response.url().to_string(),
        };
        let body = response.text().await.map_err(http_error)?;

        tracing::trace!("{} {} -> {} ({})", target, request.url, status, url);

        Ok(Fetched { status, url, body })
    }
}
