//! Transaction repository for database operations.
//!
//! Transactions are insert-only from the core's point of view: the enriched
//! cart snapshot goes into a jsonb column and is never touched again.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};

use resold_core::{Price, TransactionId, UserId};

use super::RepositoryError;
use crate::models::{EnrichedLine, Transaction};

/// A transaction about to be persisted (checkout step 6).
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub buyer_id: UserId,
    pub buyer_name: String,
    pub lines: Vec<EnrichedLine>,
    pub total: Price,
    pub timestamp: DateTime<Utc>,
}

/// Time-range filter for the admin sales log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TransactionFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(FromRow)]
struct TransactionRow {
    id: i32,
    buyer_id: i32,
    buyer_name: String,
    lines: Json<Vec<EnrichedLine>>,
    total: Price,
    created_at: DateTime<Utc>,
    delivered: bool,
}

impl From<TransactionRow> for Transaction {
    fn from(row: TransactionRow) -> Self {
        Self {
            id: TransactionId::new(row.id),
            buyer_id: UserId::new(row.buyer_id),
            buyer_name: row.buyer_name,
            cart: row.lines.0,
            total: row.total,
            timestamp: row.created_at,
            delivered: row.delivered,
        }
    }
}

const TRANSACTION_COLUMNS: &str =
    "id, buyer_id, buyer_name, lines, total, created_at, delivered";

/// Repository for transaction database operations.
pub struct TransactionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TransactionRepository<'a> {
    /// Create a new transaction repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a checkout snapshot, returning its generated id.
    ///
    /// `delivered` always starts false; flipping it belongs to fulfillment,
    /// not this system.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(&self, new: NewTransaction) -> Result<TransactionId, RepositoryError> {
        let (id,): (i32,) = sqlx::query_as(
            "INSERT INTO transactions (buyer_id, buyer_name, lines, total, created_at, delivered)
             VALUES ($1, $2, $3, $4, $5, FALSE)
             RETURNING id",
        )
        .bind(new.buyer_id.as_i32())
        .bind(new.buyer_name)
        .bind(Json(new.lines))
        .bind(new.total)
        .bind(new.timestamp)
        .fetch_one(self.pool)
        .await?;

        Ok(TransactionId::new(id))
    }

    /// All of one buyer's transactions, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_buyer(&self, buyer: UserId) -> Result<Vec<Transaction>, RepositoryError> {
        let rows = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions
             WHERE buyer_id = $1
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(buyer.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Transaction::from).collect())
    }

    /// The sales log, optionally bounded to a time range, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: TransactionFilter,
    ) -> Result<Vec<Transaction>, RepositoryError> {
        let rows = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions
             WHERE ($1::timestamptz IS NULL OR created_at >= $1)
               AND ($2::timestamptz IS NULL OR created_at <= $2)
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(filter.from)
        .bind(filter.to)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Transaction::from).collect())
    }
}
