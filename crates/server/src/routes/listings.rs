//! Public listing route handlers: browse, metadata, highlights, detail.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::instrument;

use resold_core::{ListingId, Price};

use crate::db::listings::{ListingFilter, NewListing};
use crate::db::{ListingRepository, ReviewRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{Listing, ListingDetail, ListingSummary};
use crate::state::AppState;

/// Browse query parameters.
#[derive(Debug, Deserialize)]
pub struct BrowseQuery {
    pub search: Option<String>,
    pub brand: Option<String>,
    #[serde(rename = "maxPrice")]
    pub max_price: Option<Decimal>,
}

/// Metadata response: filter options for the browse page.
#[derive(Debug, Serialize)]
pub struct MetadataResponse {
    pub brands: Vec<String>,
    #[serde(rename = "maxPrice")]
    pub max_price: Price,
}

/// Browse enabled listings with optional filters.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<BrowseQuery>,
) -> Result<Json<Vec<ListingSummary>>> {
    let filter = ListingFilter {
        search: query.search,
        brand: query.brand,
        max_price: query.max_price,
    };

    let listings = ListingRepository::new(state.pool()).browse(&filter).await?;
    Ok(Json(listings))
}

/// Distinct brands and the maximum price, for filter widgets.
#[instrument(skip(state))]
pub async fn metadata(State(state): State<AppState>) -> Result<Json<MetadataResponse>> {
    let (brands, max_price) = ListingRepository::new(state.pool()).metadata().await?;
    Ok(Json(MetadataResponse { brands, max_price }))
}

/// The five enabled listings closest to selling out.
#[instrument(skip(state))]
pub async fn sold_out_soon(State(state): State<AppState>) -> Result<Json<Vec<Listing>>> {
    let listings = ListingRepository::new(state.pool()).sold_out_soon().await?;
    Ok(Json(listings))
}

/// The five best-rated enabled listings (minimum two reviews).
#[instrument(skip(state))]
pub async fn bestsellers(State(state): State<AppState>) -> Result<Json<Vec<ListingSummary>>> {
    let listings = ListingRepository::new(state.pool()).bestsellers().await?;
    Ok(Json(listings))
}

/// Body for creating a listing.
#[derive(Debug, Deserialize)]
pub struct NewListingPayload {
    pub title: Option<String>,
    pub brand: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub image: Option<String>,
}

/// Validate a new-listing payload, collecting every problem.
fn validate_new_listing(payload: &NewListingPayload) -> std::result::Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if payload.title.as_deref().is_none_or(|t| t.trim().is_empty()) {
        errors.push("Title is required".to_owned());
    }
    if payload.brand.as_deref().is_none_or(|b| b.trim().is_empty()) {
        errors.push("Brand is required".to_owned());
    }
    if payload.price.is_none_or(|p| p <= Decimal::ZERO) {
        errors.push("Price must be a positive number".to_owned());
    }
    if payload.stock.is_none_or(|s| s < 0) {
        errors.push("Stock must be a non-negative integer".to_owned());
    }
    if payload.image.as_deref().is_none_or(|i| i.trim().is_empty()) {
        errors.push("Image is required".to_owned());
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Create a listing owned by the caller.
#[instrument(skip(state, principal, payload))]
pub async fn create(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Json(payload): Json<NewListingPayload>,
) -> Result<(StatusCode, Json<Listing>)> {
    validate_new_listing(&payload).map_err(AppError::Validation)?;

    // Every field was checked present above; the defaults never apply
    let listing = ListingRepository::new(state.pool())
        .insert(NewListing {
            title: payload.title.unwrap_or_default(),
            brand: payload.brand.unwrap_or_default(),
            price: payload.price.unwrap_or_default(),
            stock: payload.stock.unwrap_or_default(),
            image: payload.image.unwrap_or_default(),
            seller_id: principal.user_id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(listing)))
}

/// Body for adding a review.
#[derive(Debug, Deserialize)]
pub struct NewReviewPayload {
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

/// Add a review to a listing.
#[instrument(skip(state, principal, payload))]
pub async fn add_review(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<NewReviewPayload>,
) -> Result<Json<Value>> {
    let (Some(rating), Some(comment)) = (payload.rating, payload.comment) else {
        return Err(AppError::BadRequest("Rating and comment required".to_owned()));
    };

    if !(1..=5).contains(&rating) {
        return Err(AppError::BadRequest(
            "Rating must be between 1 and 5".to_owned(),
        ));
    }

    let id = ListingId::new(id);
    let pool = state.pool();

    ListingRepository::new(pool)
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Listing not found".to_owned()))?;

    ReviewRepository::new(pool)
        .insert(id, principal.user_id, rating, &comment)
        .await?;

    Ok(Json(json!({
        "message": "Review added",
        "review": {
            "reviewer": principal.user_id,
            "rating": rating,
            "comment": comment,
            "fullname": principal.full_name(),
        }
    })))
}

/// Listing detail: seller attribution plus reviews with reviewer names.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ListingDetail>> {
    let id = ListingId::new(id);
    let pool = state.pool();

    let listing = ListingRepository::new(pool)
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Not found".to_owned()))?;

    let seller_names = UserRepository::new(pool)
        .display_names(&[listing.seller_id])
        .await?;
    let seller_name = seller_names
        .get(&listing.seller_id)
        .cloned()
        .unwrap_or_else(|| "Unknown".to_owned());

    let reviews = ReviewRepository::new(pool).views_for_listing(id).await?;

    Ok(Json(ListingDetail {
        id: listing.id,
        title: listing.title,
        brand: listing.brand,
        image: listing.image,
        stock: listing.stock,
        price: listing.price,
        seller_name,
        reviews,
    }))
}
