//! Database operations for the marketplace `PostgreSQL` instance.
//!
//! # Tables
//!
//! - `users` - Accounts (buyers, sellers, admins) and moderation flags
//! - `listings` - Phones for sale; `stock` is the checkout invariant target
//! - `reviews` - One row per review, replacing the old embedded arrays
//! - `cart_lines` - One row per (user, listing) pair, quantity > 0
//! - `transactions` - Immutable checkout snapshots (jsonb line items)
//! - `notifications` - Append-only order events
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p resold-cli -- migrate
//! ```
//!
//! Queries use the runtime sqlx API (`query_as`/`query` with bound
//! parameters) so the workspace builds without a live database.

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub mod carts;
pub mod listings;
pub mod notifications;
pub mod reviews;
pub mod transactions;
pub mod users;

pub use carts::CartRepository;
pub use listings::ListingRepository;
pub use notifications::NotificationRepository;
pub use reviews::ReviewRepository;
pub use transactions::TransactionRepository;
pub use users::UserRepository;

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
