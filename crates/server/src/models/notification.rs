//! Notification domain types.
//!
//! Notifications are an append-only event log for admin visibility; exactly
//! one is written per successful checkout and none are ever updated or
//! deleted by regular flows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use resold_core::{ListingId, NotificationId, Price, TransactionId, UserId};

/// Compact item reference carried by a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationItem {
    #[serde(rename = "itemID")]
    pub listing_id: ListingId,
    pub quantity: i32,
}

/// An order-placed event.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: NotificationId,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "transactionId")]
    pub transaction_id: TransactionId,
    #[serde(rename = "buyerID")]
    pub buyer_id: UserId,
    #[serde(rename = "buyerName")]
    pub buyer_name: String,
    pub items: Vec<NotificationItem>,
    pub total: Price,
    pub timestamp: DateTime<Utc>,
}

/// Event kind written at checkout.
pub const ORDER_PLACED: &str = "order_placed";
