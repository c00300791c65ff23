//! HTTP route handlers for the marketplace API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (verifies database)
//!
//! # Cart (bearer token required)
//! GET  /cart                   - Enriched cart + total
//! GET  /cart/quantity          - Total item count
//! POST /cart/add               - Add/merge lines
//! POST /cart/update            - Overwrite quantities on existing lines
//! POST /cart/delete            - Remove lines
//! GET  /cart/checkout          - Validate, commit stock, snapshot, clear, notify
//!
//! # Orders (bearer token required)
//! GET  /orders                 - Caller's past transactions
//!
//! # Listings (browse is public; writes need a bearer token)
//! GET  /listings               - Browse (search, brand, maxPrice filters)
//! POST /listings               - Create a listing owned by the caller
//! GET  /listings/metadata      - Distinct brands + max price
//! GET  /listings/soldoutsoon   - Five lowest-stock listings
//! GET  /listings/bestsellers   - Five best-rated listings (min 2 reviews)
//! GET  /listings/{id}          - Detail with seller name and reviews
//! POST /listings/{id}/reviews  - Add a review
//!
//! # Admin (admin token required)
//! GET    /admin/users                      - List/search users
//! PUT    /admin/users/{id}                 - Edit profile/role/disabled
//! PUT    /admin/users/{id}/disable         - Set disabled flag
//! DELETE /admin/users/{id}                 - Delete user
//! GET    /admin/users/{id}/listings        - Listings owned by user
//! GET    /admin/users/{id}/reviews         - Reviews written by user
//! GET    /admin/listings                   - List/search listings + sellers
//! PUT    /admin/listings/{id}              - Edit listing fields
//! PUT    /admin/listings/{id}/disable      - Force-disable listing
//! DELETE /admin/listings/{id}              - Delete listing
//! GET    /admin/reviews                    - All reviews (search, showHidden)
//! PUT    /admin/reviews/{id}/visibility    - Toggle hidden flag
//! GET    /admin/transactions               - Sales log (from/to filters)
//! GET    /admin/transactions/export        - Export sales (csv or json)
//! GET    /admin/notifications              - Order events, newest first
//! ```

pub mod admin;
pub mod cart;
pub mod listings;
pub mod orders;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/quantity", get(cart::quantity))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/delete", post(cart::remove))
        .route("/checkout", get(cart::checkout))
}

/// Create the listing routes router.
pub fn listing_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(listings::index).post(listings::create))
        .route("/metadata", get(listings::metadata))
        .route("/soldoutsoon", get(listings::sold_out_soon))
        .route("/bestsellers", get(listings::bestsellers))
        .route("/{id}", get(listings::show))
        .route("/{id}/reviews", post(listings::add_review))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(admin::list_users))
        .route("/users/{id}", put(admin::update_user).delete(admin::delete_user))
        .route("/users/{id}/disable", put(admin::disable_user))
        .route("/users/{id}/listings", get(admin::user_listings))
        .route("/users/{id}/reviews", get(admin::user_reviews))
        .route("/listings", get(admin::list_listings))
        .route(
            "/listings/{id}",
            put(admin::update_listing).delete(admin::delete_listing),
        )
        .route("/listings/{id}/disable", put(admin::disable_listing))
        .route("/reviews", get(admin::list_reviews))
        .route("/reviews/{id}/visibility", put(admin::set_review_visibility))
        .route("/transactions", get(admin::list_transactions))
        .route("/transactions/export", get(admin::export_transactions))
        .route("/notifications", get(admin::list_notifications))
}

/// Create all routes for the marketplace API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/cart", cart_routes())
        .route("/orders", get(orders::index))
        .nest("/listings", listing_routes())
        .nest("/admin", admin_routes())
}
