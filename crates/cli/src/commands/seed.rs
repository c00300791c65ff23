//! Seed the database with demo accounts and listings.
//!
//! Intended for local development: inserts an admin, two sellers with a few
//! phones each, and a buyer, plus enough reviews that the bestsellers query
//! has something to rank. Running it twice duplicates nothing — seeded users
//! are looked up by email first.

use rust_decimal::Decimal;
use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;

use resold_server::db;

/// Errors from seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Insert demo data.
///
/// # Errors
///
/// Returns `SeedError` if the database URL is missing or a write fails.
pub async fn run() -> Result<(), SeedError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("RESOLD_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| SeedError::MissingEnvVar("RESOLD_DATABASE_URL"))?;

    let pool = db::create_pool(&database_url).await?;

    let admin = upsert_user(&pool, "Avery", "Admin", "admin@resold.example", "admin").await?;
    let seller_one = upsert_user(&pool, "Sam", "Seller", "sam@resold.example", "user").await?;
    let seller_two = upsert_user(&pool, "Robin", "Reseller", "robin@resold.example", "user").await?;
    let buyer = upsert_user(&pool, "Casey", "Buyer", "casey@resold.example", "user").await?;

    let phones = [
        ("Pixel 6", "Google", "128.00", 5, seller_one),
        ("Pixel 7a", "Google", "219.00", 3, seller_one),
        ("iPhone 12", "Apple", "310.50", 4, seller_one),
        ("iPhone SE", "Apple", "145.00", 2, seller_two),
        ("Galaxy S21", "Samsung", "240.00", 6, seller_two),
        ("Galaxy A54", "Samsung", "180.00", 1, seller_two),
    ];

    let mut listing_ids = Vec::new();
    for (title, brand, price, stock, seller) in phones {
        let price: Decimal = price.parse().unwrap_or(Decimal::ONE);
        listing_ids.push(upsert_listing(&pool, title, brand, price, stock, seller).await?);
    }

    // Two reviews on the first two phones so average ratings surface
    for &listing in listing_ids.iter().take(2) {
        insert_review(&pool, listing, buyer, 5, "Arrived quickly, works great").await?;
        insert_review(&pool, listing, admin, 4, "Battery holds up better than expected").await?;
    }

    info!("Seed complete: 4 users, {} listings", listing_ids.len());
    Ok(())
}

async fn upsert_user(
    pool: &PgPool,
    firstname: &str,
    lastname: &str,
    email: &str,
    role: &str,
) -> Result<i32, SeedError> {
    let existing: Option<(i32,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    if let Some((id,)) = existing {
        return Ok(id);
    }

    let (id,): (i32,) = sqlx::query_as(
        "INSERT INTO users (firstname, lastname, email, role, verified)
         VALUES ($1, $2, $3, $4, TRUE)
         RETURNING id",
    )
    .bind(firstname)
    .bind(lastname)
    .bind(email)
    .bind(role)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

async fn upsert_listing(
    pool: &PgPool,
    title: &str,
    brand: &str,
    price: Decimal,
    stock: i32,
    seller: i32,
) -> Result<i32, SeedError> {
    let existing: Option<(i32,)> =
        sqlx::query_as("SELECT id FROM listings WHERE title = $1 AND seller_id = $2")
            .bind(title)
            .bind(seller)
            .fetch_optional(pool)
            .await?;

    if let Some((id,)) = existing {
        return Ok(id);
    }

    let (id,): (i32,) = sqlx::query_as(
        "INSERT INTO listings (title, brand, price, stock, image, seller_id)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING id",
    )
    .bind(title)
    .bind(brand)
    .bind(price)
    .bind(stock)
    .bind(format!("{}.jpg", title.to_lowercase().replace(' ', "-")))
    .bind(seller)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

async fn insert_review(
    pool: &PgPool,
    listing: i32,
    reviewer: i32,
    rating: i32,
    comment: &str,
) -> Result<(), SeedError> {
    let existing: Option<(i32,)> = sqlx::query_as(
        "SELECT id FROM reviews WHERE listing_id = $1 AND reviewer_id = $2",
    )
    .bind(listing)
    .bind(reviewer)
    .fetch_optional(pool)
    .await?;

    if existing.is_some() {
        return Ok(());
    }

    sqlx::query(
        "INSERT INTO reviews (listing_id, reviewer_id, rating, comment)
         VALUES ($1, $2, $3, $4)",
    )
    .bind(listing)
    .bind(reviewer)
    .bind(rating)
    .bind(comment)
    .execute(pool)
    .await?;

    Ok(())
}
