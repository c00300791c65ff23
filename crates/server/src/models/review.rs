//! Review domain types.
//!
//! Reviews live in their own table rather than embedded in the listing
//! document; moderation addresses them by id.

use serde::Serialize;

use resold_core::{ListingId, ReviewId, UserId};

/// A review left on a listing.
#[derive(Debug, Clone, Serialize)]
pub struct Review {
    pub id: ReviewId,
    #[serde(rename = "listingId")]
    pub listing_id: ListingId,
    #[serde(rename = "reviewer")]
    pub reviewer_id: UserId,
    pub rating: i32,
    pub comment: String,
    pub hidden: bool,
}

/// Review as shown on a listing detail page.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewView {
    pub rating: i32,
    pub comment: String,
    pub hidden: bool,
    #[serde(rename = "reviewer")]
    pub reviewer_id: UserId,
    /// Reviewer's display name, "Unknown" when the account is gone.
    pub fullname: String,
}

/// Review joined with listing and reviewer context (moderation list).
#[derive(Debug, Clone, Serialize)]
pub struct ReviewWithContext {
    #[serde(rename = "reviewId")]
    pub review_id: ReviewId,
    #[serde(rename = "listingId")]
    pub listing_id: ListingId,
    #[serde(rename = "listingTitle")]
    pub listing_title: String,
    pub rating: i32,
    pub comment: String,
    pub hidden: bool,
    #[serde(rename = "reviewerName")]
    pub reviewer_name: String,
}

/// A user's review linked to the listing it was left on (moderation view).
#[derive(Debug, Clone, Serialize)]
pub struct UserReview {
    #[serde(rename = "reviewId")]
    pub review_id: ReviewId,
    #[serde(rename = "listingId")]
    pub listing_id: ListingId,
    #[serde(rename = "listingTitle")]
    pub listing_title: String,
    pub rating: i32,
    pub comment: String,
    pub hidden: bool,
}
