//! Listing repository for database operations.
//!
//! Stock mutation lives here: checkout decrements through
//! [`ListingRepository::decrement_stock`], a conditional update that never
//! lets stock go below zero even when checkouts race.

use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};

use resold_core::{ListingId, Price, UserId};

use super::RepositoryError;
use crate::models::{Listing, ListingSummary, ListingWithSeller};

/// Browse filters for the public listing index.
#[derive(Debug, Default, Clone)]
pub struct ListingFilter {
    /// Case-insensitive substring match on the title.
    pub search: Option<String>,
    /// Exact brand match.
    pub brand: Option<String>,
    /// Upper bound on price.
    pub max_price: Option<Decimal>,
}

/// A listing about to be created by a seller.
#[derive(Debug, Clone)]
pub struct NewListing {
    pub title: String,
    pub brand: String,
    pub price: Decimal,
    pub stock: i32,
    pub image: String,
    pub seller_id: UserId,
}

/// Fields an admin may edit on a listing.
///
/// `None` means "leave unchanged".
#[derive(Debug, Default, Clone)]
pub struct ListingUpdate {
    pub title: Option<String>,
    pub brand: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub disabled: Option<bool>,
}

#[derive(FromRow)]
struct ListingRow {
    id: i32,
    title: String,
    brand: String,
    price: Price,
    stock: i32,
    image: String,
    seller_id: i32,
    disabled: bool,
}

impl From<ListingRow> for Listing {
    fn from(row: ListingRow) -> Self {
        Self {
            id: ListingId::new(row.id),
            title: row.title,
            brand: row.brand,
            price: row.price,
            stock: row.stock,
            image: row.image,
            seller_id: UserId::new(row.seller_id),
            disabled: row.disabled,
        }
    }
}

#[derive(FromRow)]
struct SummaryRow {
    id: i32,
    title: String,
    brand: String,
    image: String,
    stock: i32,
    price: Price,
    average_rating: Option<f64>,
}

impl From<SummaryRow> for ListingSummary {
    fn from(row: SummaryRow) -> Self {
        Self {
            id: ListingId::new(row.id),
            title: row.title,
            brand: row.brand,
            image: row.image,
            stock: row.stock,
            price: row.price,
            average_rating: row.average_rating,
        }
    }
}

#[derive(FromRow)]
struct WithSellerRow {
    id: i32,
    title: String,
    brand: String,
    image: String,
    price: Price,
    stock: i32,
    disabled: bool,
    seller_id: i32,
    seller_name: String,
}

impl From<WithSellerRow> for ListingWithSeller {
    fn from(row: WithSellerRow) -> Self {
        Self {
            id: ListingId::new(row.id),
            title: row.title,
            brand: row.brand,
            image: row.image,
            price: row.price,
            stock: row.stock,
            disabled: row.disabled,
            seller_id: UserId::new(row.seller_id),
            seller_name: row.seller_name,
        }
    }
}

const LISTING_COLUMNS: &str = "id, title, brand, price, stock, image, seller_id, disabled";

/// A listing has at least this many reviews before an average is shown.
const MIN_REVIEWS_FOR_RATING: i64 = 2;

/// Repository for listing database operations.
pub struct ListingRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ListingRepository<'a> {
    /// Create a new listing repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a listing by its ID (disabled listings included — carts may
    /// already reference them).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_id(&self, id: ListingId) -> Result<Option<Listing>, RepositoryError> {
        let row = sqlx::query_as::<_, ListingRow>(&format!(
            "SELECT {LISTING_COLUMNS} FROM listings WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Listing::from))
    }

    /// Create a listing, returning it with its generated id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(&self, new: NewListing) -> Result<Listing, RepositoryError> {
        let row = sqlx::query_as::<_, ListingRow>(&format!(
            "INSERT INTO listings (title, brand, price, stock, image, seller_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {LISTING_COLUMNS}"
        ))
        .bind(new.title)
        .bind(new.brand)
        .bind(new.price)
        .bind(new.stock)
        .bind(new.image)
        .bind(new.seller_id.as_i32())
        .fetch_one(self.pool)
        .await?;

        Ok(Listing::from(row))
    }

    /// Browse enabled listings with optional search/brand/price filters.
    ///
    /// The average rating is only surfaced once a listing has at least two
    /// reviews.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn browse(
        &self,
        filter: &ListingFilter,
    ) -> Result<Vec<ListingSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, SummaryRow>(
            "SELECT l.id, l.title, l.brand, l.image, l.stock, l.price,
                    CASE WHEN COUNT(r.id) >= $4
                         THEN AVG(r.rating)::float8
                         ELSE NULL END AS average_rating
             FROM listings l
             LEFT JOIN reviews r ON r.listing_id = l.id
             WHERE NOT l.disabled
               AND ($1::text IS NULL OR l.title ILIKE $1)
               AND ($2::text IS NULL OR l.brand = $2)
               AND ($3::numeric IS NULL OR l.price <= $3)
             GROUP BY l.id
             ORDER BY l.id",
        )
        .bind(filter.search.as_ref().map(|s| format!("%{s}%")))
        .bind(filter.brand.as_deref())
        .bind(filter.max_price)
        .bind(MIN_REVIEWS_FOR_RATING)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(ListingSummary::from).collect())
    }

    /// Distinct brands and the highest price among enabled listings.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn metadata(&self) -> Result<(Vec<String>, Price), RepositoryError> {
        let brands: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT brand FROM listings WHERE NOT disabled ORDER BY brand")
                .fetch_all(self.pool)
                .await?;

        let (max_price,): (Decimal,) = sqlx::query_as(
            "SELECT COALESCE(MAX(price), 0) FROM listings WHERE NOT disabled",
        )
        .fetch_one(self.pool)
        .await?;

        Ok((
            brands.into_iter().map(|(b,)| b).collect(),
            Price::new(max_price),
        ))
    }

    /// The five enabled listings closest to selling out (stock > 0).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn sold_out_soon(&self) -> Result<Vec<Listing>, RepositoryError> {
        let rows = sqlx::query_as::<_, ListingRow>(&format!(
            "SELECT {LISTING_COLUMNS} FROM listings
             WHERE stock > 0 AND NOT disabled
             ORDER BY stock ASC, id ASC
             LIMIT 5"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Listing::from).collect())
    }

    /// The five best-rated enabled listings (minimum two reviews).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn bestsellers(&self) -> Result<Vec<ListingSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, SummaryRow>(
            "SELECT l.id, l.title, l.brand, l.image, l.stock, l.price,
                    AVG(r.rating)::float8 AS average_rating
             FROM listings l
             JOIN reviews r ON r.listing_id = l.id
             WHERE NOT l.disabled
             GROUP BY l.id
             HAVING COUNT(r.id) >= $1
             ORDER BY AVG(r.rating) DESC, l.id ASC
             LIMIT 5",
        )
        .bind(MIN_REVIEWS_FOR_RATING)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(ListingSummary::from).collect())
    }

    /// Decrement stock by `quantity` only if enough stock remains.
    ///
    /// This is the checkout commit step: the condition and the write are a
    /// single statement, so two racing checkouts cannot both take the last
    /// unit.
    ///
    /// # Returns
    ///
    /// `true` if the decrement was applied, `false` if the precondition no
    /// longer held (or the listing vanished).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn decrement_stock(
        &self,
        id: ListingId,
        quantity: i32,
    ) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("UPDATE listings SET stock = stock - $2 WHERE id = $1 AND stock >= $2")
                .bind(id.as_i32())
                .bind(quantity)
                .execute(self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Listings joined with seller display names (moderation view),
    /// optionally filtered by a case-insensitive search over title/brand.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_with_sellers(
        &self,
        search: Option<&str>,
    ) -> Result<Vec<ListingWithSeller>, RepositoryError> {
        let rows = sqlx::query_as::<_, WithSellerRow>(
            "SELECT l.id, l.title, l.brand, l.image, l.price, l.stock, l.disabled,
                    l.seller_id, u.firstname || ' ' || u.lastname AS seller_name
             FROM listings l
             JOIN users u ON u.id = l.seller_id
             WHERE $1::text IS NULL OR l.title ILIKE $1 OR l.brand ILIKE $1
             ORDER BY l.id",
        )
        .bind(search.map(|s| format!("%{s}%")))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(ListingWithSeller::from).collect())
    }

    /// All listings owned by a seller.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_seller(&self, seller: UserId) -> Result<Vec<Listing>, RepositoryError> {
        let rows = sqlx::query_as::<_, ListingRow>(&format!(
            "SELECT {LISTING_COLUMNS} FROM listings WHERE seller_id = $1 ORDER BY id"
        ))
        .bind(seller.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Listing::from).collect())
    }

    /// Apply an admin edit, returning the updated listing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the listing doesn't exist.
    pub async fn update(
        &self,
        id: ListingId,
        up: ListingUpdate,
    ) -> Result<Listing, RepositoryError> {
        let row = sqlx::query_as::<_, ListingRow>(&format!(
            "UPDATE listings SET
                title    = COALESCE($2, title),
                brand    = COALESCE($3, brand),
                price    = COALESCE($4, price),
                stock    = COALESCE($5, stock),
                disabled = COALESCE($6, disabled)
             WHERE id = $1
             RETURNING {LISTING_COLUMNS}"
        ))
        .bind(id.as_i32())
        .bind(up.title)
        .bind(up.brand)
        .bind(up.price)
        .bind(up.stock)
        .bind(up.disabled)
        .fetch_optional(self.pool)
        .await?;

        row.map(Listing::from).ok_or(RepositoryError::NotFound)
    }

    /// Force-disable a listing (moderation).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the listing doesn't exist.
    pub async fn set_disabled(&self, id: ListingId, disabled: bool) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE listings SET disabled = $2 WHERE id = $1")
            .bind(id.as_i32())
            .bind(disabled)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Delete a listing.
    ///
    /// # Returns
    ///
    /// Returns `true` if the listing was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ListingId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM listings WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
