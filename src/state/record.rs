//! Product records and the page/variant facts they are assembled from

use std::collections::BTreeMap;

/// Output column order for product records
pub const CSV_COLUMNS: [&str; 14] = [
    "date",
    "product_id",
    "product_name",
    "quantity",
    "upc",
    "vendor",
    "sku",
    "price",
    "in_stock",
    "has_variants",
    "product_url",
    "main_image_url",
    "secondary_image_urls",
    "product_cart_id",
];

/// Facts shared by every variant on one product page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageFacts {
    pub date: String,
    pub product_url: String,
    pub main_image_url: String,
    pub secondary_image_urls: Vec<String>,
    pub weight: String,
    pub dimensions: String,

    /// Specs table rows, keys lowercased with underscores
    pub attributes: BTreeMap<String, String>,
}

/// Facts specific to one purchasable variant
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariantFacts {
    pub product_id: String,
    pub product_name: String,
    pub vendor: String,
    pub sku: String,
    pub price: String,
    pub in_stock: bool,
    pub product_cart_id: String,
}

/// One output row
///
/// `quantity` only carries meaning when `in_stock` is true; out-of-stock
/// records always carry 0.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    pub date: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub upc: String,
    pub vendor: String,
    pub sku: String,
    pub price: String,
    pub in_stock: bool,
    pub has_variants: bool,
    pub product_url: String,
    pub main_image_url: String,
    pub secondary_image_urls: Vec<String>,
    pub product_cart_id: String,
    pub weight: String,
    pub dimensions: String,
    pub attributes: BTreeMap<String, String>,
}

impl ProductRecord {
    /// Builds a record from the shared page facts and one variant's overrides
    ///
    /// The quantity starts at 0; in-stock records get theirs from probing.
    pub fn assemble(page: &PageFacts, variant: VariantFacts, has_variants: bool) -> Self {
        Self {
            date: page.date.clone(),
            product_id: variant.product_id,
            product_name: variant.product_name,
            quantity: 0,
            upc: page.attributes.get("upc").cloned().unwrap_or_default(),
            vendor: variant.vendor,
            sku: variant.sku,
            price: variant.price,
            in_stock: variant.in_stock,
            has_variants,
            product_url: page.product_url.clone(),
            main_image_url: page.main_image_url.clone(),
            secondary_image_urls: page.secondary_image_urls.clone(),
            product_cart_id: variant.product_cart_id,
            weight: page.weight.clone(),
            dimensions: page.dimensions.clone(),
            attributes: page.attributes.clone(),
        }
    }

    /// Returns the record's values in `CSV_COLUMNS` order
    pub fn csv_row(&self) -> [String; 14] {
        [
            self.date.clone(),
            self.product_id.clone(),
            self.product_name.clone(),
            self.quantity.to_string(),
            self.upc.clone(),
            self.vendor.clone(),
            self.sku.clone(),
            self.price.clone(),
            self.in_stock.to_string(),
            self.has_variants.to_string(),
            self.product_url.clone(),
            self.main_image_url.clone(),
            self.secondary_image_urls.join(", "),
            self.product_cart_id.clone(),
        ]
    }
}
