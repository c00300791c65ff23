//! Review repository for database operations.

use sqlx::{FromRow, PgPool};

use resold_core::{ListingId, ReviewId, UserId};

use super::RepositoryError;
use crate::models::{ReviewView, ReviewWithContext, UserReview};

#[derive(FromRow)]
struct ViewRow {
    rating: i32,
    comment: String,
    hidden: bool,
    reviewer_id: i32,
    fullname: Option<String>,
}

#[derive(FromRow)]
struct ContextRow {
    review_id: i32,
    listing_id: i32,
    listing_title: String,
    rating: i32,
    comment: String,
    hidden: bool,
    reviewer_name: String,
}

#[derive(FromRow)]
struct UserReviewRow {
    review_id: i32,
    listing_id: i32,
    listing_title: String,
    rating: i32,
    comment: String,
    hidden: bool,
}

/// Repository for review database operations.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Add a review to a listing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails (including a
    /// foreign-key failure when the listing is gone).
    pub async fn insert(
        &self,
        listing: ListingId,
        reviewer: UserId,
        rating: i32,
        comment: &str,
    ) -> Result<ReviewId, RepositoryError> {
        let (id,): (i32,) = sqlx::query_as(
            "INSERT INTO reviews (listing_id, reviewer_id, rating, comment)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(listing.as_i32())
        .bind(reviewer.as_i32())
        .bind(rating)
        .bind(comment)
        .fetch_one(self.pool)
        .await?;

        Ok(ReviewId::new(id))
    }

    /// Reviews on a listing, with reviewer display names resolved.
    ///
    /// Reviews from deleted accounts render as "Unknown" rather than being
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn views_for_listing(
        &self,
        listing: ListingId,
    ) -> Result<Vec<ReviewView>, RepositoryError> {
        let rows = sqlx::query_as::<_, ViewRow>(
            "SELECT r.rating, r.comment, r.hidden, r.reviewer_id,
                    u.firstname || ' ' || u.lastname AS fullname
             FROM reviews r
             LEFT JOIN users u ON u.id = r.reviewer_id
             WHERE r.listing_id = $1
             ORDER BY r.id",
        )
        .bind(listing.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ReviewView {
                rating: row.rating,
                comment: row.comment,
                hidden: row.hidden,
                reviewer_id: UserId::new(row.reviewer_id),
                fullname: row.fullname.unwrap_or_else(|| "Unknown".to_owned()),
            })
            .collect())
    }

    /// All reviews across listings (moderation list).
    ///
    /// `show_hidden` includes reviews already moderated away; `search`
    /// matches listing title or reviewer name, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(
        &self,
        search: Option<&str>,
        show_hidden: bool,
    ) -> Result<Vec<ReviewWithContext>, RepositoryError> {
        let rows = sqlx::query_as::<_, ContextRow>(
            "SELECT r.id AS review_id, l.id AS listing_id, l.title AS listing_title,
                    r.rating, r.comment, r.hidden,
                    u.firstname || ' ' || u.lastname AS reviewer_name
             FROM reviews r
             JOIN listings l ON l.id = r.listing_id
             JOIN users u ON u.id = r.reviewer_id
             WHERE ($1 OR NOT r.hidden)
               AND ($2::text IS NULL
                    OR l.title ILIKE $2
                    OR u.firstname ILIKE $2
                    OR u.lastname ILIKE $2)
             ORDER BY r.id",
        )
        .bind(show_hidden)
        .bind(search.map(|s| format!("%{s}%")))
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ReviewWithContext {
                review_id: ReviewId::new(row.review_id),
                listing_id: ListingId::new(row.listing_id),
                listing_title: row.listing_title,
                rating: row.rating,
                comment: row.comment,
                hidden: row.hidden,
                reviewer_name: row.reviewer_name,
            })
            .collect())
    }

    /// All reviews written by one user, linked to listing titles.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn by_user(&self, reviewer: UserId) -> Result<Vec<UserReview>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserReviewRow>(
            "SELECT r.id AS review_id, l.id AS listing_id, l.title AS listing_title,
                    r.rating, r.comment, r.hidden
             FROM reviews r
             JOIN listings l ON l.id = r.listing_id
             WHERE r.reviewer_id = $1
             ORDER BY r.id",
        )
        .bind(reviewer.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| UserReview {
                review_id: ReviewId::new(row.review_id),
                listing_id: ListingId::new(row.listing_id),
                listing_title: row.listing_title,
                rating: row.rating,
                comment: row.comment,
                hidden: row.hidden,
            })
            .collect())
    }

    /// Set a review's hidden flag (moderation visibility toggle).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the review doesn't exist.
    pub async fn set_hidden(&self, id: ReviewId, hidden: bool) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE reviews SET hidden = $2 WHERE id = $1")
            .bind(id.as_i32())
            .bind(hidden)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
