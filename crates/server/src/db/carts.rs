//! Cart repository for database operations.
//!
//! A cart is the set of `cart_lines` rows for one user; the primary key
//! (user, listing) guarantees at most one line per listing. Batched
//! mutations go through [`CartRepository::apply_batch`], which commits all
//! writes in a single transaction — a batch is visible either in full or
//! not at all.

use sqlx::{FromRow, PgPool};

use resold_core::{ListingId, UserId};

use super::RepositoryError;
use crate::models::CartLine;

/// A single staged cart write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineWrite {
    /// Insert the line, or overwrite its quantity if it already exists.
    Upsert {
        listing_id: ListingId,
        quantity: i32,
    },
    /// Remove the line.
    Remove { listing_id: ListingId },
}

#[derive(FromRow)]
struct CartLineRow {
    listing_id: i32,
    quantity: i32,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        Self {
            listing_id: ListingId::new(row.listing_id),
            quantity: row.quantity,
        }
    }
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All lines in a user's cart, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, user: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartLineRow>(
            "SELECT listing_id, quantity FROM cart_lines
             WHERE user_id = $1
             ORDER BY added_at, listing_id",
        )
        .bind(user.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(CartLine::from).collect())
    }

    /// Apply a batch of staged writes in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any write fails; the
    /// transaction is rolled back and no write is visible.
    pub async fn apply_batch(
        &self,
        user: UserId,
        writes: &[LineWrite],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        for write in writes {
            match *write {
                LineWrite::Upsert {
                    listing_id,
                    quantity,
                } => {
                    sqlx::query(
                        "INSERT INTO cart_lines (user_id, listing_id, quantity)
                         VALUES ($1, $2, $3)
                         ON CONFLICT (user_id, listing_id)
                         DO UPDATE SET quantity = EXCLUDED.quantity",
                    )
                    .bind(user.as_i32())
                    .bind(listing_id.as_i32())
                    .bind(quantity)
                    .execute(&mut *tx)
                    .await?;
                }
                LineWrite::Remove { listing_id } => {
                    sqlx::query("DELETE FROM cart_lines WHERE user_id = $1 AND listing_id = $2")
                        .bind(user.as_i32())
                        .bind(listing_id.as_i32())
                        .execute(&mut *tx)
                        .await?;
                }
            }
        }

        tx.commit().await?;

        Ok(())
    }

    /// Empty the user's cart (checkout clear step).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, user: UserId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM cart_lines WHERE user_id = $1")
            .bind(user.as_i32())
            .execute(self.pool)
            .await?;

        Ok(())
    }
}
