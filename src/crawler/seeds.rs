//! Frontier seeding inputs: candidate URL filtering and the local input list

use crate::SounderError;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct InputRow {
    #[serde(default)]
    product_url: Option<String>,
}

/// Normalizes a candidate product URL, or rejects it
///
/// Trailing slashes are stripped. The URL is rejected when empty, when it
/// has fewer than three `/` separators, or when it does not end with
/// `page_suffix`.
pub fn normalize_candidate(url: &str, page_suffix: &str) -> Option<String> {
    let url = url.trim().trim_end_matches('/');

    if url.is_empty() || url.matches('/').count() < 3 || !url.ends_with(page_suffix) {
        return None;
    }

    Some(url.to_string())
}

/// Loads product URLs from the local override CSV
///
/// The file needs a `product_url` column; other columns are ignored. A
/// missing file is not an error and yields no URLs.
pub fn load_input_urls(path: &Path) -> Result<Vec<String>, SounderError> {
    if !path.exists() {
        tracing::debug!("No input list at {}", path.display());
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let mut urls = Vec::new();

    for row in reader.deserialize::<InputRow>() {
        match row {
            Ok(InputRow {
                product_url: Some(url),
            }) if !url.trim().is_empty() => urls.push(url.trim().to_string()),
            Ok(_) => {}
            Err(e) => tracing::debug!("Skipping malformed input row: {}", e),
        }
    }

    tracing::info!("Loaded {} input URLs from {}", urls.len(), path.display());
    Ok(urls)
}
