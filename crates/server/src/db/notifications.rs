//! Notification repository for database operations.
//!
//! Append-only: there is deliberately no update or delete here.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};

use resold_core::{NotificationId, Price, TransactionId, UserId};

use super::RepositoryError;
use crate::models::{Notification, NotificationItem};

/// An event about to be appended (checkout step 7).
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub kind: String,
    pub transaction_id: TransactionId,
    pub buyer_id: UserId,
    pub buyer_name: String,
    pub items: Vec<NotificationItem>,
    pub total: Price,
    pub timestamp: DateTime<Utc>,
}

#[derive(FromRow)]
struct NotificationRow {
    id: i32,
    kind: String,
    transaction_id: i32,
    buyer_id: i32,
    buyer_name: String,
    items: Json<Vec<NotificationItem>>,
    total: Price,
    created_at: DateTime<Utc>,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Self {
            id: NotificationId::new(row.id),
            kind: row.kind,
            transaction_id: TransactionId::new(row.transaction_id),
            buyer_id: UserId::new(row.buyer_id),
            buyer_name: row.buyer_name,
            items: row.items.0,
            total: row.total,
            timestamp: row.created_at,
        }
    }
}

/// Repository for notification database operations.
pub struct NotificationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> NotificationRepository<'a> {
    /// Create a new notification repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Append an event, returning its generated id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn append(&self, new: NewNotification) -> Result<NotificationId, RepositoryError> {
        let (id,): (i32,) = sqlx::query_as(
            "INSERT INTO notifications
                 (kind, transaction_id, buyer_id, buyer_name, items, total, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING id",
        )
        .bind(new.kind)
        .bind(new.transaction_id.as_i32())
        .bind(new.buyer_id.as_i32())
        .bind(new.buyer_name)
        .bind(Json(new.items))
        .bind(new.total)
        .bind(new.timestamp)
        .fetch_one(self.pool)
        .await?;

        Ok(NotificationId::new(id))
    }

    /// All events, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Notification>, RepositoryError> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            "SELECT id, kind, transaction_id, buyer_id, buyer_name, items, total, created_at
             FROM notifications
             ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Notification::from).collect())
    }
}
