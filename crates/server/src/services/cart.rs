//! The cart store: batched add/update/remove plus raw reads.
//!
//! Every batch is staged in memory against the current cart and the live
//! listings, collecting one error per bad line. Only a fully valid batch is
//! written, in a single transaction — unlike line-at-a-time commits, a batch
//! with one bad line leaves the cart untouched.

use std::collections::{BTreeMap, HashMap};

use sqlx::PgPool;
use thiserror::Error;

use resold_core::{ListingId, UserId};

use crate::db::carts::LineWrite;
use crate::db::{CartRepository, ListingRepository, RepositoryError};
use crate::models::{CartLine, EnrichedCart, Listing};
use crate::services::pricing;

/// Errors from cart batch operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// One message per failed line; nothing was written.
    #[error("cart line errors: {}", .0.join("; "))]
    Lines(Vec<String>),

    /// Storage failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Cart operations for one user at a time.
pub struct CartService<'a> {
    pool: &'a PgPool,
    carts: CartRepository<'a>,
    listings: ListingRepository<'a>,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            carts: CartRepository::new(pool),
            listings: ListingRepository::new(pool),
        }
    }

    /// Raw cart lines (no enrichment).
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` on storage failure.
    pub async fn lines(&self, user: UserId) -> Result<Vec<CartLine>, CartError> {
        Ok(self.carts.lines(user).await?)
    }

    /// The enriched cart with its computed total.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` on storage failure.
    pub async fn render(&self, user: UserId) -> Result<EnrichedCart, CartError> {
        let lines = self.carts.lines(user).await?;
        Ok(pricing::enrich_lines(self.pool, &lines).await?)
    }

    /// Total number of items across the cart's lines.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` on storage failure.
    pub async fn quantity(&self, user: UserId) -> Result<i64, CartError> {
        let lines = self.carts.lines(user).await?;
        Ok(pricing::item_count(&lines))
    }

    /// Add lines to the cart, merging quantities into existing lines.
    ///
    /// A line fails if its listing is missing or the merged quantity would
    /// exceed the listing's stock. Any failure aborts the whole batch.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Lines` with one message per failed line, or
    /// `CartError::Repository` on storage failure.
    pub async fn add_items(
        &self,
        user: UserId,
        requests: &[CartLine],
    ) -> Result<Vec<CartLine>, CartError> {
        let cart = self.carts.lines(user).await?;
        let listings = self.fetch_listings(requests.iter().map(|r| r.listing_id)).await?;

        let writes = stage_add(&cart, requests, &listings).map_err(CartError::Lines)?;

        self.carts.apply_batch(user, &writes).await?;
        Ok(self.carts.lines(user).await?)
    }

    /// Overwrite quantities on lines that are already in the cart.
    ///
    /// A line fails if its listing is missing, the line isn't in the cart,
    /// or the new quantity exceeds stock. Any failure aborts the batch.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Lines` with one message per failed line, or
    /// `CartError::Repository` on storage failure.
    pub async fn update_items(
        &self,
        user: UserId,
        requests: &[CartLine],
    ) -> Result<Vec<CartLine>, CartError> {
        let cart = self.carts.lines(user).await?;
        let listings = self.fetch_listings(requests.iter().map(|r| r.listing_id)).await?;

        let writes = stage_update(&cart, requests, &listings).map_err(CartError::Lines)?;

        self.carts.apply_batch(user, &writes).await?;
        Ok(self.carts.lines(user).await?)
    }

    /// Remove lines from the cart.
    ///
    /// A line fails if its listing is missing from the catalog or the line
    /// isn't in the cart (so removing twice reports the second attempt).
    ///
    /// # Errors
    ///
    /// Returns `CartError::Lines` with one message per failed line, or
    /// `CartError::Repository` on storage failure.
    pub async fn remove_items(
        &self,
        user: UserId,
        item_ids: &[ListingId],
    ) -> Result<Vec<CartLine>, CartError> {
        let cart = self.carts.lines(user).await?;
        let listings = self.fetch_listings(item_ids.iter().copied()).await?;

        let writes = stage_remove(&cart, item_ids, &listings).map_err(CartError::Lines)?;

        self.carts.apply_batch(user, &writes).await?;
        Ok(self.carts.lines(user).await?)
    }

    /// Fetch each distinct requested listing once.
    async fn fetch_listings(
        &self,
        ids: impl Iterator<Item = ListingId>,
    ) -> Result<HashMap<ListingId, Listing>, RepositoryError> {
        let mut map = HashMap::new();
        for id in ids {
            if map.contains_key(&id) {
                continue;
            }
            if let Some(listing) = self.listings.find_by_id(id).await? {
                map.insert(id, listing);
            }
        }
        Ok(map)
    }
}

// =============================================================================
// Batch staging (pure)
// =============================================================================

fn not_found(id: ListingId) -> String {
    format!("Item with ID {id} not found")
}

fn not_found_in_db(id: ListingId) -> String {
    format!("Item with ID {id} not found in database")
}

fn not_in_cart(id: ListingId) -> String {
    format!("{id} doesn't exist in the user's cart")
}

fn insufficient_stock(id: ListingId, wanted: i32, stock: i32) -> String {
    format!("Not enough stock for {id}: requested {wanted} when there's {stock}")
}

/// Stage an add batch: merge requested quantities into the current cart.
///
/// Duplicate ids within one request merge onto each other in order.
pub(crate) fn stage_add(
    cart: &[CartLine],
    requests: &[CartLine],
    listings: &HashMap<ListingId, Listing>,
) -> Result<Vec<LineWrite>, Vec<String>> {
    let mut staged: BTreeMap<ListingId, i32> =
        cart.iter().map(|l| (l.listing_id, l.quantity)).collect();
    let mut touched: Vec<ListingId> = Vec::new();
    let mut errors = Vec::new();

    for request in requests {
        let Some(listing) = listings.get(&request.listing_id) else {
            errors.push(not_found(request.listing_id));
            continue;
        };

        let merged = staged.get(&request.listing_id).copied().unwrap_or(0) + request.quantity;
        if merged > listing.stock {
            errors.push(insufficient_stock(request.listing_id, merged, listing.stock));
            continue;
        }

        staged.insert(request.listing_id, merged);
        if !touched.contains(&request.listing_id) {
            touched.push(request.listing_id);
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(touched
        .into_iter()
        .map(|id| LineWrite::Upsert {
            listing_id: id,
            quantity: staged[&id],
        })
        .collect())
}

/// Stage an update batch: overwrite quantities on existing lines.
pub(crate) fn stage_update(
    cart: &[CartLine],
    requests: &[CartLine],
    listings: &HashMap<ListingId, Listing>,
) -> Result<Vec<LineWrite>, Vec<String>> {
    let in_cart: BTreeMap<ListingId, i32> =
        cart.iter().map(|l| (l.listing_id, l.quantity)).collect();
    let mut writes = Vec::new();
    let mut errors = Vec::new();

    for request in requests {
        let Some(listing) = listings.get(&request.listing_id) else {
            errors.push(not_found_in_db(request.listing_id));
            continue;
        };

        if !in_cart.contains_key(&request.listing_id) {
            errors.push(not_in_cart(request.listing_id));
            continue;
        }

        if request.quantity > listing.stock {
            errors.push(insufficient_stock(
                request.listing_id,
                request.quantity,
                listing.stock,
            ));
            continue;
        }

        writes.push(LineWrite::Upsert {
            listing_id: request.listing_id,
            quantity: request.quantity,
        });
    }

    if errors.is_empty() { Ok(writes) } else { Err(errors) }
}

/// Stage a remove batch.
pub(crate) fn stage_remove(
    cart: &[CartLine],
    item_ids: &[ListingId],
    listings: &HashMap<ListingId, Listing>,
) -> Result<Vec<LineWrite>, Vec<String>> {
    let in_cart: BTreeMap<ListingId, i32> =
        cart.iter().map(|l| (l.listing_id, l.quantity)).collect();
    let mut writes = Vec::new();
    let mut errors = Vec::new();

    for &id in item_ids {
        if !listings.contains_key(&id) {
            errors.push(not_found_in_db(id));
            continue;
        }

        if !in_cart.contains_key(&id) {
            errors.push(not_in_cart(id));
            continue;
        }

        writes.push(LineWrite::Remove { listing_id: id });
    }

    if errors.is_empty() { Ok(writes) } else { Err(errors) }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use resold_core::{Price, UserId};

    fn listing(id: i32, stock: i32) -> (ListingId, Listing) {
        (
            ListingId::new(id),
            Listing {
                id: ListingId::new(id),
                title: format!("Phone {id}"),
                brand: "TestBrand".to_owned(),
                price: Price::from_cents(10_000),
                stock,
                image: "phone.jpg".to_owned(),
                seller_id: UserId::new(1),
                disabled: false,
            },
        )
    }

    fn line(id: i32, quantity: i32) -> CartLine {
        CartLine {
            listing_id: ListingId::new(id),
            quantity,
        }
    }

    // --- add ---

    #[test]
    fn add_appends_a_new_line() {
        let listings = HashMap::from([listing(1, 3)]);
        let writes = stage_add(&[], &[line(1, 2)], &listings).unwrap();
        assert_eq!(
            writes,
            vec![LineWrite::Upsert {
                listing_id: ListingId::new(1),
                quantity: 2
            }]
        );
    }

    #[test]
    fn add_merges_into_an_existing_line() {
        let listings = HashMap::from([listing(1, 10)]);
        let writes = stage_add(&[line(1, 2)], &[line(1, 3)], &listings).unwrap();
        assert_eq!(
            writes,
            vec![LineWrite::Upsert {
                listing_id: ListingId::new(1),
                quantity: 5
            }]
        );
    }

    #[test]
    fn add_rejects_when_merged_quantity_exceeds_stock() {
        // stock 3, cart already holds 2: adding 2 more merges to 4 > 3
        let listings = HashMap::from([listing(1, 3)]);
        let errors = stage_add(&[line(1, 2)], &[line(1, 2)], &listings).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Not enough stock"));
        assert!(errors[0].contains("requested 4 when there's 3"));
    }

    #[test]
    fn add_reports_missing_listings() {
        let errors = stage_add(&[], &[line(9, 1)], &HashMap::new()).unwrap_err();
        assert_eq!(errors, vec!["Item with ID 9 not found".to_owned()]);
    }

    #[test]
    fn add_rejects_whole_batch_when_any_line_fails() {
        // First line is fine on its own, second is unknown: nothing is staged
        let listings = HashMap::from([listing(1, 5)]);
        let errors = stage_add(&[], &[line(1, 1), line(9, 1)], &listings).unwrap_err();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn add_collects_every_failing_line() {
        let listings = HashMap::from([listing(1, 1)]);
        let errors = stage_add(&[], &[line(1, 5), line(8, 1), line(9, 2)], &listings).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn add_merges_duplicate_ids_within_one_request() {
        let listings = HashMap::from([listing(1, 10)]);
        let writes = stage_add(&[], &[line(1, 2), line(1, 3)], &listings).unwrap();
        assert_eq!(
            writes,
            vec![LineWrite::Upsert {
                listing_id: ListingId::new(1),
                quantity: 5
            }]
        );
    }

    // --- update ---

    #[test]
    fn update_overwrites_quantity() {
        let listings = HashMap::from([listing(1, 10)]);
        let writes = stage_update(&[line(1, 2)], &[line(1, 7)], &listings).unwrap();
        assert_eq!(
            writes,
            vec![LineWrite::Upsert {
                listing_id: ListingId::new(1),
                quantity: 7
            }]
        );
    }

    #[test]
    fn update_requires_line_in_cart() {
        let listings = HashMap::from([listing(1, 10)]);
        let errors = stage_update(&[], &[line(1, 2)], &listings).unwrap_err();
        assert_eq!(errors, vec!["1 doesn't exist in the user's cart".to_owned()]);
    }

    #[test]
    fn update_rejects_quantity_above_stock() {
        let listings = HashMap::from([listing(1, 3)]);
        let errors = stage_update(&[line(1, 1)], &[line(1, 4)], &listings).unwrap_err();
        assert!(errors[0].contains("Not enough stock"));
    }

    // --- remove ---

    #[test]
    fn remove_deletes_the_line() {
        let listings = HashMap::from([listing(1, 3)]);
        let writes = stage_remove(&[line(1, 2)], &[ListingId::new(1)], &listings).unwrap();
        assert_eq!(
            writes,
            vec![LineWrite::Remove {
                listing_id: ListingId::new(1)
            }]
        );
    }

    #[test]
    fn remove_twice_reports_item_not_in_cart() {
        // After the first removal the cart no longer holds the line
        let listings = HashMap::from([listing(1, 3)]);
        let errors = stage_remove(&[], &[ListingId::new(1)], &listings).unwrap_err();
        assert_eq!(errors, vec!["1 doesn't exist in the user's cart".to_owned()]);
    }

    #[test]
    fn remove_requires_listing_in_catalog() {
        let errors = stage_remove(&[line(9, 1)], &[ListingId::new(9)], &HashMap::new()).unwrap_err();
        assert_eq!(errors, vec!["Item with ID 9 not found in database".to_owned()]);
    }
}
