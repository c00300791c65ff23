//! End-to-end tests for the admin moderation surface.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The server running (cargo run -p resold-server)
//! - `RESOLD_JWT_SECRET` matching between server and tests
//!
//! Run with: cargo test -p resold-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::{Value, json};

use resold_integration_tests::{base_url, client, create_test_user, mint_token, test_pool};

async fn admin_token() -> String {
    let pool = test_pool().await;
    let id = create_test_user(&pool, "Avery", "Admin", "admin").await;
    mint_token(id, "Avery", "Admin", "admin")
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn admin_surface_rejects_regular_users() {
    let pool = test_pool().await;
    let id = create_test_user(&pool, "Regular", "User", "user").await;
    let token = mint_token(id, "Regular", "User", "user");

    let resp = client()
        .get(format!("{}/admin/users", base_url()))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn user_disable_toggle_roundtrip() {
    let pool = test_pool().await;
    let target = create_test_user(&pool, "To", "Disable", "user").await;
    let admin = admin_token().await;

    let resp = client()
        .put(format!("{}/admin/users/{target}/disable", base_url()))
        .bearer_auth(&admin)
        .json(&json!({"disabled": true}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["disabled"], true);

    // A body without the boolean is a 400
    let resp = client()
        .put(format!("{}/admin/users/{target}/disable", base_url()))
        .bearer_auth(&admin)
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // An unknown user is a 404
    let resp = client()
        .put(format!("{}/admin/users/999999/disable", base_url()))
        .bearer_auth(&admin)
        .json(&json!({"disabled": true}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn review_visibility_toggle_hides_from_default_list() {
    let pool = test_pool().await;
    let seller_id = create_test_user(&pool, "Sam", "Seller", "user").await;
    let reviewer_id = create_test_user(&pool, "Riley", "Reviewer", "user").await;
    let seller = mint_token(seller_id, "Sam", "Seller", "user");
    let reviewer = mint_token(reviewer_id, "Riley", "Reviewer", "user");
    let admin = admin_token().await;

    // Seller lists a phone, reviewer reviews it
    let listing: Value = client()
        .post(format!("{}/listings", base_url()))
        .bearer_auth(&seller)
        .json(&json!({
            "title": "Galaxy S21",
            "brand": "Samsung",
            "price": "240.00",
            "stock": 2,
            "image": "galaxy-s21.jpg"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let listing_id = listing["id"].as_i64().unwrap();

    let resp = client()
        .post(format!("{}/listings/{listing_id}/reviews", base_url()))
        .bearer_auth(&reviewer)
        .json(&json!({"rating": 2, "comment": "Scratched screen, not as described"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // Find the review in the moderation list
    let reviews: Value = client()
        .get(format!("{}/admin/reviews", base_url()))
        .bearer_auth(&admin)
        .query(&[("search", "Riley")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let review = reviews
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["listingId"].as_i64() == Some(listing_id))
        .expect("review should be visible")
        .clone();
    let review_id = review["reviewId"].as_i64().unwrap();

    // Hide it
    let resp = client()
        .put(format!("{}/admin/reviews/{review_id}/visibility", base_url()))
        .bearer_auth(&admin)
        .json(&json!({"hidden": true}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // Gone from the default list, present with showHidden=true
    let visible: Value = client()
        .get(format!("{}/admin/reviews", base_url()))
        .bearer_auth(&admin)
        .query(&[("search", "Riley")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(
        !visible
            .as_array()
            .unwrap()
            .iter()
            .any(|r| r["reviewId"].as_i64() == Some(review_id))
    );

    let all: Value = client()
        .get(format!("{}/admin/reviews", base_url()))
        .bearer_auth(&admin)
        .query(&[("search", "Riley"), ("showHidden", "true")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(
        all.as_array()
            .unwrap()
            .iter()
            .any(|r| r["reviewId"].as_i64() == Some(review_id)
                && r["hidden"].as_bool() == Some(true))
    );
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn sales_export_supports_csv_and_json() {
    let admin = admin_token().await;

    let resp = client()
        .get(format!("{}/admin/transactions/export", base_url()))
        .bearer_auth(&admin)
        .query(&[("format", "csv")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(
        resp.headers()[reqwest::header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/csv")
    );
    let body = resp.text().await.unwrap();
    assert!(body.starts_with("timestamp,buyerName,items,total"));

    // Default format is JSON
    let resp = client()
        .get(format!("{}/admin/transactions/export", base_url()))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert!(body.is_array());
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn user_review_listing_for_unknown_user_is_404() {
    let admin = admin_token().await;

    let resp = client()
        .get(format!("{}/admin/users/999999/reviews", base_url()))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
