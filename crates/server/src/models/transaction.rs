//! Transaction domain types.
//!
//! A transaction is the immutable snapshot created by a successful checkout.
//! The core never mutates one after insert; the `delivered` flag belongs to
//! a fulfillment process outside this system.

use chrono::{DateTime, Utc};
use serde::Serialize;

use resold_core::{Price, TransactionId, UserId};

use super::cart::EnrichedLine;

/// An immutable record of a completed purchase.
#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub id: TransactionId,
    #[serde(rename = "buyerID")]
    pub buyer_id: UserId,
    #[serde(rename = "buyerName")]
    pub buyer_name: String,
    /// The enriched cart exactly as it stood at checkout.
    pub cart: Vec<EnrichedLine>,
    pub total: Price,
    pub timestamp: DateTime<Utc>,
    pub delivered: bool,
}
