//! Binary-search state for discovering a cart's purchase limit
//!
//! The only signal available is whether adding `quantity` units to the cart
//! succeeded. Each observation halves the remaining interval
//! `[lower_limit, upper_limit)`; the search stops once the midpoint collapses
//! onto `lower_limit`.

use crate::state::ProductRecord;

/// Working state of one quantity probe
///
/// Invariant: `lower_limit <= quantity <= upper_limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeState {
    /// Quantity the next cart-add attempt asks for
    pub quantity: u32,

    /// Largest quantity known to be purchasable
    pub lower_limit: u32,

    /// Smallest quantity known (or assumed) not to be purchasable
    pub upper_limit: u32,

    max_quantity: u32,
}

/// What to do after a probe observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStep {
    /// Issue another cart-add for this quantity
    Continue(u32),

    /// Search finished; the purchasable limit is the carried quantity
    Converged(u32),
}

impl ProbeState {
    /// Starts a probe over `[0, max_quantity)` at the midpoint
    pub fn new(max_quantity: u32) -> Self {
        Self {
            quantity: max_quantity / 2,
            lower_limit: 0,
            upper_limit: max_quantity,
            max_quantity,
        }
    }

    /// Folds one cart response into the search
    ///
    /// # Arguments
    ///
    /// * `accepted` - Whether the cart accepted `self.quantity` units
    pub fn record(&mut self, accepted: bool) -> ProbeStep {
        if accepted {
            self.lower_limit = self.quantity;
        } else {
            self.upper_limit = self.quantity;
        }

        self.quantity = midpoint(self.lower_limit, self.upper_limit);

        if self.is_converged() {
            ProbeStep::Converged(self.quantity)
        } else {
            ProbeStep::Continue(self.quantity)
        }
    }

    /// True once the midpoint can no longer move
    ///
    /// `quantity` never reaches `max_quantity` through the midpoint, so a
    /// product that accepts everything reports `max_quantity - 1`.
    pub fn is_converged(&self) -> bool {
        !(self.quantity < self.max_quantity && self.quantity != self.lower_limit)
    }
}

fn midpoint(lower: u32, upper: u32) -> u32 {
    lower + (upper - lower) / 2
}

/// Whether a cart response body reports success
///
/// Matches `marker` case-insensitively anywhere in the body.
pub fn cart_accepted(body: &str, marker: &str) -> bool {
    body.to_lowercase().contains(&marker.to_lowercase())
}

/// A record waiting for its quantity to be discovered
#[derive(Debug, Clone, PartialEq)]
pub struct PendingProbe {
    pub record: ProductRecord,
    pub probe: ProbeState,
}

impl PendingProbe {
    pub fn new(record: ProductRecord, max_quantity: u32) -> Self {
        Self {
            record,
            probe: ProbeState::new(max_quantity),
        }
    }

    /// Consumes the probe and returns the record with its discovered quantity
    pub fn finish(self) -> ProductRecord {
        let mut record = self.record;
        record.quantity = self.probe.quantity;
        record
    }
}
