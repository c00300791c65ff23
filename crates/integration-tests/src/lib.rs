//! Integration tests for Resold.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database and run migrations + seed
//! cargo run -p resold-cli -- migrate
//! cargo run -p resold-cli -- seed
//!
//! # Start the server
//! cargo run -p resold-server
//!
//! # Run integration tests
//! cargo test -p resold-integration-tests -- --ignored
//! ```
//!
//! Tests are `#[ignore]`d by default because they need the running stack.
//! The server location and signing secret are configurable via
//! `RESOLD_BASE_URL` and `RESOLD_JWT_SECRET`.

use jsonwebtoken::{EncodingKey, Header, encode};
use serde::Serialize;

/// Base URL for the marketplace API (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("RESOLD_BASE_URL").unwrap_or_else(|_| "http://localhost:5050".to_string())
}

/// The signing secret the server was started with.
///
/// Defaults to a development-only value; set `RESOLD_JWT_SECRET` to match
/// the server under test.
#[must_use]
pub fn jwt_secret() -> String {
    std::env::var("RESOLD_JWT_SECRET")
        .unwrap_or_else(|_| "integration-test-signing-key-0123456789".to_string())
}

#[derive(Serialize)]
struct TestClaims<'a> {
    sub: i32,
    firstname: &'a str,
    lastname: &'a str,
    role: &'a str,
    exp: i64,
}

/// Mint a bearer token the server under test will accept.
///
/// # Panics
///
/// Panics if token encoding fails (only possible with an invalid secret).
#[must_use]
pub fn mint_token(sub: i32, firstname: &str, lastname: &str, role: &str) -> String {
    let claims = TestClaims {
        sub,
        firstname,
        lastname,
        role,
        exp: chrono::Utc::now().timestamp() + 3600,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret().as_bytes()),
    )
    .expect("Failed to encode test token")
}

/// A reqwest client for the tests.
///
/// # Panics
///
/// Panics if the client cannot be constructed.
#[must_use]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .build()
        .expect("Failed to create HTTP client")
}

/// Connect to the database under test.
///
/// Bearer tokens are trusted without lookup, but cart lines reference the
/// users table, so tests insert their principals here first.
///
/// # Panics
///
/// Panics if `RESOLD_DATABASE_URL`/`DATABASE_URL` is unset or unreachable.
pub async fn test_pool() -> sqlx::PgPool {
    let url = std::env::var("RESOLD_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("RESOLD_DATABASE_URL must be set for integration tests");

    sqlx::PgPool::connect(&url)
        .await
        .expect("Failed to connect to test database")
}

/// Insert a user row and return its id, so minted tokens refer to a real
/// account. Emails are randomized per call.
///
/// # Panics
///
/// Panics if the insert fails.
pub async fn create_test_user(
    pool: &sqlx::PgPool,
    firstname: &str,
    lastname: &str,
    role: &str,
) -> i32 {
    let email = format!("{}@test.resold.example", uuid::Uuid::new_v4());

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
    .await
    .expect("Failed to create test user");

    id
}
