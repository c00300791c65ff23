//! Cart domain types.

use serde::{Deserialize, Serialize};

use resold_core::{ListingId, Price, UserId};

/// A raw cart line: which listing, how many.
///
/// A user's cart holds at most one line per listing; adds merge into the
/// existing line instead of duplicating it. Quantity is always positive —
/// zero-quantity lines are rejected at the request boundary and by the
/// storage constraint, so no pruning pass exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(rename = "itemID")]
    pub listing_id: ListingId,
    pub quantity: i32,
}

/// A cart line joined with live listing and seller data.
///
/// `price` is the line total (unit price times quantity), matching the
/// rendered-cart contract. The same shape is snapshotted into transactions
/// at checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedLine {
    #[serde(rename = "itemID")]
    pub listing_id: ListingId,
    pub quantity: i32,
    pub name: String,
    pub brand: String,
    pub image: String,
    pub price: Price,
    #[serde(rename = "sellerID")]
    pub seller_id: UserId,
    #[serde(rename = "sellerName")]
    pub seller_name: String,
}

/// Materialized cart view: enriched lines plus the computed total.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedCart {
    pub cart: Vec<EnrichedLine>,
    pub total: Price,
}

impl EnrichedCart {
    /// An empty cart.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            cart: Vec::new(),
            total: Price::ZERO,
        }
    }
}
