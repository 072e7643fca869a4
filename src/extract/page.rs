//! Product page extraction
//!
//! Turns one product page into its records: page-level facts (images, weight,
//! dimensions, specs table) are gathered once and shared by every variant,
//! while the structured payload provides the per-variant identity, price and
//! stock. Image and specs lookups degrade to empty values instead of failing.

use crate::extract::product::{find_product_data, variant_facts, ProductData};
use crate::extract::text::{clean, clean_opt};
use crate::state::{PageFacts, ProductRecord};
use crate::ExtractResult;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::OnceLock;

const GALLERY_ROLE: &str = "[data-gallery-role=gallery-placeholder]";
const GALLERY_WIDGET: &str = "mage/gallery/gallery";

/// Records extracted from one product page
#[derive(Debug, Clone, Default)]
pub struct ExtractedPage {
    pub records: Vec<ProductRecord>,

    /// Variants skipped because their payload entry was unusable
    pub skipped_variants: usize,
}

/// Extracts every record on a product page
///
/// A page whose structured payload is missing or malformed is an error; a
/// single broken variant is logged and skipped without affecting its siblings.
///
/// # Arguments
///
/// * `html` - The product page body
/// * `url` - The page URL, stored as `product_url`
/// * `date` - Crawl date stamped on every record
pub fn extract_product_page(html: &str, url: &str, date: &str) -> ExtractResult<ExtractedPage> {
    let document = Html::parse_document(html);
    let page = page_facts(&document, url, date);

    let mut extracted = ExtractedPage::default();
    match find_product_data(&document)? {
        ProductData::Single(payload) => {
            let mut variant = variant_facts(&payload)?;
            variant.product_cart_id = cart_id(&document, &variant.product_id);
            extracted
                .records
                .push(ProductRecord::assemble(&page, variant, false));
        }
        ProductData::Variants(children) => {
            for child in &children {
                match variant_facts(child) {
                    Ok(mut variant) => {
                        variant.product_cart_id = cart_id(&document, &variant.product_id);
                        extracted
                            .records
                            .push(ProductRecord::assemble(&page, variant, true));
                    }
                    Err(e) => {
                        tracing::debug!("Skipping variant on {}: {}", url, e);
                        extracted.skipped_variants += 1;
                    }
                }
            }
        }
    }

    Ok(extracted)
}

/// Gathers the facts shared by every variant on the page
pub fn page_facts(document: &Html, url: &str, date: &str) -> PageFacts {
    let main_image_url = main_image(document);
    let secondary_image_urls = gallery_images(document).unwrap_or_else(|| {
        if main_image_url.is_empty() {
            Vec::new()
        } else {
            vec![main_image_url.clone()]
        }
    });

    PageFacts {
        date: date.to_string(),
        product_url: url.to_string(),
        main_image_url,
        secondary_image_urls,
        weight: labeled_value(document, "Weight:"),
        dimensions: labeled_value(document, "Dimensions:"),
        attributes: attributes(document),
    }
}

/// Strips a `cache/<code>/` segment from a media URL
pub fn strip_image_cache(url: &str) -> String {
    static CACHE_SEGMENT: OnceLock<Option<Regex>> = OnceLock::new();

    match CACHE_SEGMENT.get_or_init(|| Regex::new(r"/cache/[^/]+/").ok()) {
        Some(re) => re.replacen(url, 1, "/").into_owned(),
        None => url.to_string(),
    }
}

fn main_image(document: &Html) -> String {
    let Ok(selector) = Selector::parse("[data-product-image]") else {
        return String::new();
    };

    document
        .select(&selector)
        .find_map(|el| el.value().attr("data-product-image"))
        .map(|src| strip_image_cache(src.trim()))
        .unwrap_or_default()
}

/// Reads thumbnail URLs from the gallery widget's init script
///
/// Returns `None` when the script is absent or does not parse, so the caller
/// can fall back to the main image.
fn gallery_images(document: &Html) -> Option<Vec<String>> {
    let selector = Selector::parse(r#"script[type="text/x-magento-init"]"#).ok()?;

    let raw = document
        .select(&selector)
        .map(|el| el.text().collect::<String>())
        .find(|text| text.contains(GALLERY_WIDGET) && text.contains("thumbs"))?;

    let config: Value = match serde_json::from_str(raw.trim()) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!("Gallery config did not parse: {}", e);
            return None;
        }
    };

    let entries = config
        .get(GALLERY_ROLE)?
        .get(GALLERY_WIDGET)?
        .get("data")?
        .as_array()?;

    let images: Vec<String> = entries
        .iter()
        .filter_map(|entry| match entry.get("thumb")? {
            Value::String(url) => Some(url.as_str()),
            Value::Array(urls) => urls.first()?.as_str(),
            _ => None,
        })
        .map(strip_image_cache)
        .collect();

    if images.is_empty() {
        tracing::debug!("Gallery config had no thumbnails");
        return None;
    }

    Some(images)
}

/// Value of the innermost `<li>` mentioning `label`, with the label removed
fn labeled_value(document: &Html, label: &str) -> String {
    let (Ok(li), Ok(span)) = (Selector::parse("li"), Selector::parse("span")) else {
        return String::new();
    };

    let text_of = |el: ElementRef| el.text().collect::<String>();

    document
        .select(&li)
        .filter(|item| text_of(*item).contains(label))
        .find(|item| !item.select(&li).any(|inner| text_of(inner).contains(label)))
        .map(|item| {
            let raw = item.select(&span).next().map_or_else(|| text_of(item), text_of);
            clean(&raw).replace(label, "").trim().to_string()
        })
        .unwrap_or_default()
}

/// Scrapes the specs table into `lowercase_with_underscores` keys
fn attributes(document: &Html) -> BTreeMap<String, String> {
    let mut details = BTreeMap::new();

    let (Ok(row), Ok(label), Ok(data)) = (
        Selector::parse("#product-attribute-specs-table tbody tr"),
        Selector::parse("th.col.label"),
        Selector::parse("td.col.data"),
    ) else {
        return details;
    };

    for tr in document.select(&row) {
        let key = tr
            .select(&label)
            .next()
            .map(|th| clean(&th.text().collect::<String>()))
            .unwrap_or_default()
            .replace(' ', "_")
            .to_lowercase();

        if key.is_empty() {
            continue;
        }

        let value = tr.select(&data).next().map(|td| td.text().collect::<String>());
        details.insert(key, clean_opt(value.as_deref()));
    }

    details
}

/// The cart identifier for a variant, keyed by its product id
fn cart_id(document: &Html, product_id: &str) -> String {
    let escaped = product_id.replace('\\', "\\\\").replace('"', "\\\"");
    let Ok(selector) = Selector::parse(&format!(r#"[data-product-sku="{}"]"#, escaped)) else {
        return String::new();
    };

    document
        .select(&selector)
        .find_map(|el| el.value().attr("data-product-id"))
        .map(|id| id.trim().to_string())
        .unwrap_or_default()
}
