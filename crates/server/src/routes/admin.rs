//! Admin moderation route handlers.
//!
//! Everything here requires an admin bearer token; `RequireAdmin` also
//! writes the audit trail entry for the request.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use resold_core::{ListingId, ReviewId, Role, UserId};

use crate::db::listings::ListingUpdate;
use crate::db::transactions::TransactionFilter;
use crate::db::users::UserUpdate;
use crate::db::{
    ListingRepository, NotificationRepository, RepositoryError, ReviewRepository,
    TransactionRepository, UserRepository,
};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{
    Listing, ListingWithSeller, Notification, ReviewWithContext, Transaction, User, UserReview,
};
use crate::state::AppState;

/// Free-text search query parameter.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

// =============================================================================
// Users
// =============================================================================

/// List users, optionally filtered by name/email search.
#[instrument(skip(state, _admin))]
pub async fn list_users(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<User>>> {
    let users = UserRepository::new(state.pool())
        .list(query.search.as_deref())
        .await?;
    Ok(Json(users))
}

/// Editable user fields.
#[derive(Debug, Deserialize)]
pub struct UserUpdatePayload {
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub disabled: Option<bool>,
}

/// Edit a user's profile fields, role, or disabled flag.
#[instrument(skip(state, _admin, payload))]
pub async fn update_user(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UserUpdatePayload>,
) -> Result<Json<User>> {
    let role = payload
        .role
        .map(|r| r.parse::<Role>())
        .transpose()
        .map_err(AppError::BadRequest)?;

    let update = UserUpdate {
        firstname: payload.firstname,
        lastname: payload.lastname,
        email: payload.email,
        role,
        disabled: payload.disabled,
    };

    let user = UserRepository::new(state.pool())
        .update(UserId::new(id), update)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("User not found".to_owned()),
            RepositoryError::Conflict(msg) => AppError::BadRequest(msg),
            other => AppError::Database(other),
        })?;

    Ok(Json(user))
}

/// Body for the disable toggle.
#[derive(Debug, Deserialize)]
pub struct DisablePayload {
    pub disabled: Option<bool>,
}

/// Set or clear a user's disabled flag.
#[instrument(skip(state, _admin, payload))]
pub async fn disable_user(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<DisablePayload>,
) -> Result<Json<Value>> {
    let Some(disabled) = payload.disabled else {
        return Err(AppError::BadRequest(
            "Must send { disabled: true|false }".to_owned(),
        ));
    };

    UserRepository::new(state.pool())
        .set_disabled(UserId::new(id), disabled)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("User not found".to_owned()),
            other => AppError::Database(other),
        })?;

    Ok(Json(json!({ "success": true, "disabled": disabled })))
}

/// Delete a user.
#[instrument(skip(state, _admin))]
pub async fn delete_user(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Value>> {
    UserRepository::new(state.pool())
        .delete(UserId::new(id))
        .await?;
    Ok(Json(json!({ "success": true })))
}

/// Listings owned by a user.
#[instrument(skip(state, _admin))]
pub async fn user_listings(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<Listing>>> {
    let listings = ListingRepository::new(state.pool())
        .list_by_seller(UserId::new(id))
        .await?;
    Ok(Json(listings))
}

/// Reviews written by a user, linked to listing titles.
#[instrument(skip(state, _admin))]
pub async fn user_reviews(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<UserReview>>> {
    let pool = state.pool();
    let user_id = UserId::new(id);

    // Confirm the user exists so an unknown id is a 404, not an empty list
    UserRepository::new(pool)
        .get_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_owned()))?;

    let reviews = ReviewRepository::new(pool).by_user(user_id).await?;
    Ok(Json(reviews))
}

// =============================================================================
// Listings
// =============================================================================

/// List listings with seller names, optionally filtered by title/brand.
#[instrument(skip(state, _admin))]
pub async fn list_listings(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<ListingWithSeller>>> {
    let listings = ListingRepository::new(state.pool())
        .list_with_sellers(query.search.as_deref())
        .await?;
    Ok(Json(listings))
}

/// Editable listing fields.
#[derive(Debug, Deserialize)]
pub struct ListingUpdatePayload {
    pub title: Option<String>,
    pub brand: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub disabled: Option<bool>,
}

/// Edit a listing's fields.
#[instrument(skip(state, _admin, payload))]
pub async fn update_listing(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<ListingUpdatePayload>,
) -> Result<Json<Listing>> {
    if payload.price.is_some_and(|p| p <= Decimal::ZERO) {
        return Err(AppError::BadRequest(
            "Price must be a positive number".to_owned(),
        ));
    }
    if payload.stock.is_some_and(|s| s < 0) {
        return Err(AppError::BadRequest(
            "Stock must be a non-negative integer".to_owned(),
        ));
    }

    let update = ListingUpdate {
        title: payload.title,
        brand: payload.brand,
        price: payload.price,
        stock: payload.stock,
        disabled: payload.disabled,
    };

    let listing = ListingRepository::new(state.pool())
        .update(ListingId::new(id), update)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("Listing not found".to_owned()),
            other => AppError::Database(other),
        })?;

    Ok(Json(listing))
}

/// Force-disable a listing.
#[instrument(skip(state, _admin))]
pub async fn disable_listing(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Value>> {
    ListingRepository::new(state.pool())
        .set_disabled(ListingId::new(id), true)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("Listing not found".to_owned()),
            other => AppError::Database(other),
        })?;

    Ok(Json(json!({ "success": true })))
}

/// Delete a listing.
#[instrument(skip(state, _admin))]
pub async fn delete_listing(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Value>> {
    ListingRepository::new(state.pool())
        .delete(ListingId::new(id))
        .await?;
    Ok(Json(json!({ "success": true })))
}

// =============================================================================
// Reviews
// =============================================================================

/// Review list query parameters.
#[derive(Debug, Deserialize)]
pub struct ReviewsQuery {
    pub search: Option<String>,
    #[serde(rename = "showHidden")]
    pub show_hidden: Option<String>,
}

/// All reviews across listings, with optional search and hidden filter.
#[instrument(skip(state, _admin))]
pub async fn list_reviews(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<ReviewsQuery>,
) -> Result<Json<Vec<ReviewWithContext>>> {
    let show_hidden = query.show_hidden.as_deref() == Some("true");

    let reviews = ReviewRepository::new(state.pool())
        .list_all(query.search.as_deref(), show_hidden)
        .await?;
    Ok(Json(reviews))
}

/// Body for the review visibility toggle.
#[derive(Debug, Deserialize)]
pub struct VisibilityPayload {
    pub hidden: Option<bool>,
}

/// Toggle the hidden flag on a review.
#[instrument(skip(state, _admin, payload))]
pub async fn set_review_visibility(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<VisibilityPayload>,
) -> Result<Json<Value>> {
    let hidden = payload.hidden.unwrap_or(false);

    ReviewRepository::new(state.pool())
        .set_hidden(ReviewId::new(id), hidden)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("Review not found".to_owned()),
            other => AppError::Database(other),
        })?;

    Ok(Json(json!({ "success": true })))
}

// =============================================================================
// Transactions & notifications
// =============================================================================

/// Sales log query parameters.
#[derive(Debug, Deserialize)]
pub struct TransactionsQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// The sales log, optionally bounded to a time range.
#[instrument(skip(state, _admin))]
pub async fn list_transactions(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<TransactionsQuery>,
) -> Result<Json<Vec<Transaction>>> {
    let transactions = TransactionRepository::new(state.pool())
        .list(TransactionFilter {
            from: query.from,
            to: query.to,
        })
        .await?;
    Ok(Json(transactions))
}

/// Export query parameters.
#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>,
}

/// Export the full sales history as CSV or JSON.
#[instrument(skip(state, _admin))]
pub async fn export_transactions(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> Result<Response> {
    let transactions = TransactionRepository::new(state.pool())
        .list(TransactionFilter::default())
        .await?;

    if query.format.as_deref() == Some("csv") {
        let body = transactions_to_csv(&transactions);
        return Ok((
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=sales.csv",
                ),
            ],
            body,
        )
            .into_response());
    }

    Ok(Json(transactions).into_response())
}

/// All order events, newest first.
#[instrument(skip(state, _admin))]
pub async fn list_notifications(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<Notification>>> {
    let notifications = NotificationRepository::new(state.pool()).list().await?;
    Ok(Json(notifications))
}

/// Render the sales history as CSV: timestamp, buyer, items, total.
fn transactions_to_csv(transactions: &[Transaction]) -> String {
    let mut out = String::from("timestamp,buyerName,items,total\n");

    for tx in transactions {
        let items = tx
            .cart
            .iter()
            .map(|line| format!("{}({})", line.name, line.quantity))
            .collect::<Vec<_>>()
            .join("; ");

        out.push_str(&format!(
            "{},{},\"{}\",{}\n",
            tx.timestamp.to_rfc3339(),
            tx.buyer_name,
            items.replace('"', "\"\""),
            tx.total.amount()
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EnrichedLine;
    use chrono::TimeZone;
    use resold_core::{Price, TransactionId};

    fn sample_transaction() -> Transaction {
        Transaction {
            id: TransactionId::new(1),
            buyer_id: UserId::new(2),
            buyer_name: "Casey Buyer".to_owned(),
            cart: vec![
                EnrichedLine {
                    listing_id: ListingId::new(3),
                    quantity: 2,
                    name: "Pixel 6".to_owned(),
                    brand: "Google".to_owned(),
                    image: "pixel6.jpg".to_owned(),
                    price: Price::from_cents(20_000),
                    seller_id: UserId::new(9),
                    seller_name: "Sam Seller".to_owned(),
                },
                EnrichedLine {
                    listing_id: ListingId::new(4),
                    quantity: 1,
                    name: "iPhone 12".to_owned(),
                    brand: "Apple".to_owned(),
                    image: "iphone12.jpg".to_owned(),
                    price: Price::from_cents(30_000),
                    seller_id: UserId::new(9),
                    seller_name: "Sam Seller".to_owned(),
                },
            ],
            total: Price::from_cents(50_000),
            timestamp: chrono::Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).single()
                .expect("valid timestamp"),
            delivered: false,
        }
    }

    #[test]
    fn csv_has_header_and_one_row_per_transaction() {
        let csv = transactions_to_csv(&[sample_transaction()]);
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "timestamp,buyerName,items,total");
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("Casey Buyer"));
        assert!(lines[1].contains("Pixel 6(2); iPhone 12(1)"));
        assert!(lines[1].ends_with("500.00"));
    }

    #[test]
    fn csv_of_no_transactions_is_just_the_header() {
        assert_eq!(transactions_to_csv(&[]), "timestamp,buyerName,items,total\n");
    }
}
