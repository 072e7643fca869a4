//! Candidate product URL discovery
//!
//! This module handles pulling candidate URLs out of:
//! - Sitemap XML (`<loc>` entries)
//! - Category and listing pages (selector-driven link extraction)

use html_escape::decode_html_entities;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::OnceLock;
use url::Url;

/// Extracts product URLs from a sitemap body
///
/// Every `<loc>` value is collected, deduplicated (first occurrence wins) and
/// kept only if it ends with `page_suffix`.
pub fn sitemap_urls(body: &str, page_suffix: &str) -> Vec<String> {
    static LOC: OnceLock<Option<Regex>> = OnceLock::new();
    let Some(loc) = LOC.get_or_init(|| Regex::new(r"(?s)<loc>\s*(.*?)\s*</loc>").ok()) else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    loc.captures_iter(body)
        .filter_map(|caps| caps.get(1))
        .map(|m| decode_html_entities(m.as_str()).into_owned())
        .filter(|url| !url.is_empty() && url.ends_with(page_suffix))
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

/// Extracts absolute links matching `selector` from an HTML page
///
/// Relative links are resolved against `base_url`; non-HTTP(S) targets and
/// fragment-only anchors are dropped. An invalid selector yields no links.
pub fn select_links(html: &str, base_url: &Url, selector: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse(selector) else {
        tracing::debug!("Invalid link selector: {}", selector);
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let mut seen = HashSet::new();

    document
        .select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel:, data: schemes
/// - Fragment-only anchors
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let mut absolute = base_url.join(href).ok()?;
    if absolute.scheme() != "http" && absolute.scheme() != "https" {
        return None;
    }
    absolute.set_fragment(None);

    Some(absolute.to_string())
}
