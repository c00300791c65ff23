//! Cart route handlers.
//!
//! Request shapes mirror the public API contract: a JSON body with a `cart`
//! array of `{itemID, quantity}` lines. Shape problems are collected and
//! returned together as 400 `{errors}`; business failures (missing listing,
//! not enough stock) come back as 404 `{errors}` with one message per line.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::instrument;

use resold_core::{ListingId, TransactionId};

use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{CartLine, EnrichedCart, Transaction};
use crate::services::{CartService, CheckoutService};
use crate::state::AppState;

/// One requested line. Fields are optional so that shape validation can
/// report every problem in the batch instead of bouncing on the first.
#[derive(Debug, Deserialize)]
pub struct LinePayload {
    #[serde(rename = "itemID")]
    pub item_id: Option<i64>,
    pub quantity: Option<i64>,
}

/// Body for add/update/delete: `{"cart": [{"itemID": .., "quantity": ..}]}`.
#[derive(Debug, Deserialize)]
pub struct CartPayload {
    pub cart: Option<Vec<LinePayload>>,
}

/// Checkout response: the new transaction id plus the full order snapshot.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub success: String,
    #[serde(rename = "orderID")]
    pub order_id: TransactionId,
    pub order: Transaction,
}

/// Validate the request shape, producing typed lines.
///
/// `require_quantity` is false for deletes, where only `itemID` matters.
fn validate_payload(
    payload: &CartPayload,
    require_quantity: bool,
) -> std::result::Result<Vec<CartLine>, Vec<String>> {
    let Some(lines) = payload.cart.as_ref().filter(|c| !c.is_empty()) else {
        return Err(vec![
            "Cart needs to be an array with at least one item".to_owned(),
        ]);
    };

    let mut parsed = Vec::with_capacity(lines.len());
    let mut errors = Vec::new();

    for line in lines {
        let item_id = match line.item_id {
            Some(id) if id > 0 && i32::try_from(id).is_ok() => {
                #[allow(clippy::cast_possible_truncation)] // checked just above
                Some(ListingId::new(id as i32))
            }
            _ => {
                errors.push("itemID needs to be a valid listing ID".to_owned());
                None
            }
        };

        let quantity = if require_quantity {
            match line.quantity {
                Some(q) if q > 0 && i32::try_from(q).is_ok() => {
                    #[allow(clippy::cast_possible_truncation)] // checked just above
                    Some(q as i32)
                }
                _ => {
                    errors.push(
                        "Quantity needs to be an integer value greater than zero".to_owned(),
                    );
                    None
                }
            }
        } else {
            Some(1)
        };

        if let (Some(item_id), Some(quantity)) = (item_id, quantity) {
            parsed.push(CartLine {
                listing_id: item_id,
                quantity,
            });
        }
    }

    if errors.is_empty() { Ok(parsed) } else { Err(errors) }
}

/// Render the enriched cart with its total.
#[instrument(skip(state, principal))]
pub async fn show(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<Json<EnrichedCart>> {
    let cart = CartService::new(state.pool())
        .render(principal.user_id)
        .await?;
    Ok(Json(cart))
}

/// Total number of items in the cart (badge count).
#[instrument(skip(state, principal))]
pub async fn quantity(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<Json<i64>> {
    let count = CartService::new(state.pool())
        .quantity(principal.user_id)
        .await?;
    Ok(Json(count))
}

/// Add lines to the cart, merging into existing lines.
#[instrument(skip(state, principal, payload))]
pub async fn add(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Json(payload): Json<CartPayload>,
) -> Result<Json<Value>> {
    let lines = validate_payload(&payload, true).map_err(AppError::Validation)?;

    let cart = CartService::new(state.pool())
        .add_items(principal.user_id, &lines)
        .await?;

    Ok(Json(json!({ "cart": cart })))
}

/// Overwrite quantities on lines already in the cart.
#[instrument(skip(state, principal, payload))]
pub async fn update(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Json(payload): Json<CartPayload>,
) -> Result<Json<Value>> {
    let lines = validate_payload(&payload, true).map_err(AppError::Validation)?;

    let cart = CartService::new(state.pool())
        .update_items(principal.user_id, &lines)
        .await?;

    Ok(Json(json!({ "cart": cart })))
}

/// Remove lines from the cart.
#[instrument(skip(state, principal, payload))]
pub async fn remove(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Json(payload): Json<CartPayload>,
) -> Result<Json<Value>> {
    let lines = validate_payload(&payload, false).map_err(AppError::Validation)?;
    let ids: Vec<ListingId> = lines.iter().map(|l| l.listing_id).collect();

    let cart = CartService::new(state.pool())
        .remove_items(principal.user_id, &ids)
        .await?;

    Ok(Json(json!({ "cart": cart })))
}

/// Run the checkout flow for the caller's cart.
#[instrument(skip(state, principal))]
pub async fn checkout(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<Json<CheckoutResponse>> {
    let receipt = CheckoutService::new(state.pool())
        .checkout(&principal)
        .await?;

    Ok(Json(CheckoutResponse {
        success: "Checkout successful!".to_owned(),
        order_id: receipt.order.id,
        order: receipt.order,
    }))
}
