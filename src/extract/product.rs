//! Structured product payload (`application/ld+json`) parsing

use crate::extract::text::clean;
use crate::state::VariantFacts;
use crate::{ExtractError, ExtractResult};
use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::Value;

/// Shape of one product entry in the structured payload
#[derive(Debug, Deserialize)]
struct ProductPayload {
    #[serde(rename = "productID", default)]
    product_id: Value,
    #[serde(default)]
    name: String,
    #[serde(default)]
    brand: Option<Brand>,
    #[serde(default)]
    sku: Value,
    offers: Offers,
}

#[derive(Debug, Deserialize)]
struct Brand {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct Offers {
    #[serde(default)]
    price: Value,
    #[serde(default)]
    availability: String,
}

/// A page's product payload, either a single product or a variant list
#[derive(Debug, Clone, PartialEq)]
pub enum ProductData {
    Single(Value),
    Variants(Vec<Value>),
}

/// Finds the structured product payload on a page
///
/// The payload is the first `application/ld+json` block that carries a
/// `productID` or `children` key; breadcrumb and organization blocks are
/// skipped.
pub fn find_product_data(document: &Html) -> ExtractResult<ProductData> {
    let selector = Selector::parse(r#"script[type="application/ld+json"]"#)
        .map_err(|_| ExtractError::MissingProductData)?;

    let mut last_error = None;
    for script in document.select(&selector) {
        let raw = script.text().collect::<String>();
        let value: Value = match serde_json::from_str(raw.trim()) {
            Ok(v) => v,
            Err(e) => {
                last_error = Some(e);
                continue;
            }
        };

        if value.get("productID").is_none() && value.get("children").is_none() {
            continue;
        }

        return match value.get("children") {
            Some(Value::Array(children)) => Ok(ProductData::Variants(children.clone())),
            Some(_) => Err(ExtractError::MissingField("children")),
            None => Ok(ProductData::Single(value)),
        };
    }

    Err(last_error.map_or(ExtractError::MissingProductData, ExtractError::from))
}

/// Maps one payload entry to its variant facts
///
/// `in_stock` is a case-insensitive `instock` substring match on
/// `offers.availability`. The cart identifier is left empty; it lives
/// elsewhere on the page.
pub fn variant_facts(payload: &Value) -> ExtractResult<VariantFacts> {
    let parsed = ProductPayload::deserialize(payload)?;

    let product_id = scalar_string(&parsed.product_id);
    if product_id.is_empty() {
        return Err(ExtractError::MissingField("productID"));
    }

    Ok(VariantFacts {
        product_id,
        product_name: clean(&parsed.name),
        vendor: parsed.brand.map(|b| clean(&b.name)).unwrap_or_default(),
        sku: scalar_string(&parsed.sku),
        price: scalar_string(&parsed.offers.price),
        in_stock: parsed.offers.availability.to_lowercase().contains("instock"),
        product_cart_id: String::new(),
    })
}

/// Renders a JSON scalar as text; anything else is empty
fn scalar_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}
