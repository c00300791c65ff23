//! Order history route handlers.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::db::TransactionRepository;
use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::Transaction;
use crate::state::AppState;

/// List the caller's past transactions, newest first.
#[instrument(skip(state, principal))]
pub async fn index(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<Json<Vec<Transaction>>> {
    let orders = TransactionRepository::new(state.pool())
        .list_for_buyer(principal.user_id)
        .await?;
    Ok(Json(orders))
}
