//! State module for records in flight
//!
//! # Components
//!
//! - `ProductRecord`: One output row, assembled from page-level and variant-level facts
//! - `ProbeState`: Binary-search bounds for an in-stock record's purchasable quantity
//! - `PendingProbe`: A record paired with the probe that will fill in its quantity

mod probe;
mod record;

// Re-export main types
pub use probe::{cart_accepted, PendingProbe, ProbeState, ProbeStep};
pub use record::{PageFacts, ProductRecord, VariantFacts, CSV_COLUMNS};
