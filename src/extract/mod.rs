//! Extraction module for turning fetched pages into data
//!
//! This module handles:
//! - Text normalization for scraped values
//! - Structured product payload parsing
//! - Product page extraction (images, specs, variants, cart ids)
//! - Candidate URL discovery from sitemaps and category listings

mod discovery;
mod page;
mod product;
mod text;

pub use discovery::{select_links, sitemap_urls};
pub use page::{extract_product_page, page_facts, strip_image_cache, ExtractedPage};
pub use product::{find_product_data, variant_facts, ProductData};
pub use text::{clean, clean_opt};
