//! Listing (phone) domain types.

use serde::Serialize;

use resold_core::{ListingId, Price, UserId};

use super::review::ReviewView;

/// A phone listing.
///
/// `stock` is the only numeric field the checkout path mutates; it must
/// never go below zero.
#[derive(Debug, Clone, Serialize)]
pub struct Listing {
    pub id: ListingId,
    pub title: String,
    pub brand: String,
    pub price: Price,
    pub stock: i32,
    pub image: String,
    #[serde(rename = "seller")]
    pub seller_id: UserId,
    pub disabled: bool,
}

/// Browse-view projection of a listing.
///
/// `average_rating` is `None` until a listing has at least two reviews, so a
/// single opinion never ranks a phone.
#[derive(Debug, Clone, Serialize)]
pub struct ListingSummary {
    pub id: ListingId,
    pub title: String,
    pub brand: String,
    pub image: String,
    pub stock: i32,
    pub price: Price,
    #[serde(rename = "averageRating")]
    pub average_rating: Option<f64>,
}

/// Listing joined with its seller's display name (moderation view).
#[derive(Debug, Clone, Serialize)]
pub struct ListingWithSeller {
    pub id: ListingId,
    pub title: String,
    pub brand: String,
    pub image: String,
    pub price: Price,
    pub stock: i32,
    pub disabled: bool,
    #[serde(rename = "seller")]
    pub seller_id: UserId,
    #[serde(rename = "sellerName")]
    pub seller_name: String,
}

/// Full listing detail: seller attribution plus reviews with reviewer names.
#[derive(Debug, Clone, Serialize)]
pub struct ListingDetail {
    pub id: ListingId,
    pub title: String,
    pub brand: String,
    pub image: String,
    pub stock: i32,
    pub price: Price,
    #[serde(rename = "sellerName")]
    pub seller_name: String,
    pub reviews: Vec<ReviewView>,
}
