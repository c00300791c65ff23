//! The checkout orchestrator.
//!
//! One checkout attempt walks a fixed sequence: load the cart, validate
//! every line against live stock, commit the stock decrements, snapshot the
//! enriched cart, clear the cart, persist the transaction, append the
//! notification. Failure at the validation gate aborts with nothing
//! mutated; after the gate the steps are independent writes and a crash
//! between them is not recovered.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::PgPool;
use thiserror::Error;

use resold_core::ListingId;

use crate::db::notifications::NewNotification;
use crate::db::transactions::NewTransaction;
use crate::db::{
    CartRepository, ListingRepository, NotificationRepository, RepositoryError,
    TransactionRepository,
};
use crate::models::notification::ORDER_PLACED;
use crate::models::{CartLine, Listing, NotificationItem, Principal, Transaction};
use crate::services::pricing;

/// Errors from a checkout attempt.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The user has nothing in their cart.
    #[error("cart is empty")]
    EmptyCart,

    /// One or more lines failed validation; nothing was mutated.
    #[error("checkout rejected: {}", .0.join("; "))]
    Rejected(Vec<String>),

    /// Storage failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// The result of a successful checkout.
#[derive(Debug)]
pub struct CheckoutReceipt {
    /// The persisted order, id included.
    pub order: Transaction,
}

/// Orchestrates the cart-to-transaction flow.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
    carts: CartRepository<'a>,
    listings: ListingRepository<'a>,
    transactions: TransactionRepository<'a>,
    notifications: NotificationRepository<'a>,
}

impl<'a> CheckoutService<'a> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            carts: CartRepository::new(pool),
            listings: ListingRepository::new(pool),
            transactions: TransactionRepository::new(pool),
            notifications: NotificationRepository::new(pool),
        }
    }

    /// Run a checkout for the authenticated buyer.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` if there is nothing to buy,
    /// `CheckoutError::Rejected` with per-line messages if any line fails
    /// stock validation (no mutation has happened), or
    /// `CheckoutError::Repository` on storage failure.
    pub async fn checkout(&self, buyer: &Principal) -> Result<CheckoutReceipt, CheckoutError> {
        // 1. Load
        let lines = self.carts.lines(buyer.user_id).await?;
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        // 2. Validate: every line against live stock, all errors aggregated
        let mut listings: HashMap<ListingId, Listing> = HashMap::new();
        for line in &lines {
            if let Some(listing) = self.listings.find_by_id(line.listing_id).await? {
                listings.insert(line.listing_id, listing);
            }
        }

        let errors = validate_lines(&lines, &listings);
        if !errors.is_empty() {
            return Err(CheckoutError::Rejected(errors));
        }

        // 3. Commit stock: per-line conditional decrements. A decrement that
        // no longer matches lost a race with a concurrent purchase; it is
        // logged but not surfaced per-line to the caller.
        for line in &lines {
            let applied = self
                .listings
                .decrement_stock(line.listing_id, line.quantity)
                .await?;
            if !applied {
                tracing::error!(
                    listing = %line.listing_id,
                    quantity = line.quantity,
                    "stock commit skipped: concurrent update exhausted stock"
                );
            }
        }

        // 4. Snapshot the enriched cart
        let enriched = pricing::enrich_lines(self.pool, &lines).await?;
        let now = Utc::now();

        // 5. Clear the cart
        self.carts.clear(buyer.user_id).await?;

        // 6. Persist the transaction
        let transaction_id = self
            .transactions
            .insert(NewTransaction {
                buyer_id: buyer.user_id,
                buyer_name: buyer.full_name(),
                lines: enriched.cart.clone(),
                total: enriched.total,
                timestamp: now,
            })
            .await?;

        // 7. Emit the notification
        self.notifications
            .append(NewNotification {
                kind: ORDER_PLACED.to_owned(),
                transaction_id,
                buyer_id: buyer.user_id,
                buyer_name: buyer.full_name(),
                items: lines
                    .iter()
                    .map(|line| NotificationItem {
                        listing_id: line.listing_id,
                        quantity: line.quantity,
                    })
                    .collect(),
                total: enriched.total,
                timestamp: now,
            })
            .await?;

        // 8. Respond
        Ok(CheckoutReceipt {
            order: Transaction {
                id: transaction_id,
                buyer_id: buyer.user_id,
                buyer_name: buyer.full_name(),
                cart: enriched.cart,
                total: enriched.total,
                timestamp: now,
                delivered: false,
            },
        })
    }
}

/// The validation gate: one message per invalid line, empty when the whole
/// cart can be purchased.
pub(crate) fn validate_lines(
    lines: &[CartLine],
    listings: &HashMap<ListingId, Listing>,
) -> Vec<String> {
    let mut errors = Vec::new();

    for line in lines {
        match listings.get(&line.listing_id) {
            None => errors.push(format!("Item with ID {} not found", line.listing_id)),
            Some(listing) if line.quantity > listing.stock => {
                errors.push(format!(
                    "Not enough stock for {}: buying {} when there's {}",
                    line.listing_id, line.quantity, listing.stock
                ));
            }
            Some(_) => {}
        }
    }

    errors
}

#[cfg(test)]
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

    #[test]
    fn valid_cart_passes_the_gate() {
        let listings = HashMap::from([listing(1, 5), listing(2, 2)]);
        assert!(validate_lines(&[line(1, 2), line(2, 2)], &listings).is_empty());
    }

    #[test]
    fn exact_stock_is_purchasable() {
        let listings = HashMap::from([listing(1, 3)]);
        assert!(validate_lines(&[line(1, 3)], &listings).is_empty());
    }

    #[test]
    fn rejects_quantity_above_stock() {
        let listings = HashMap::from([listing(1, 1)]);
        let errors = validate_lines(&[line(1, 2)], &listings);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("buying 2 when there's 1"));
    }

    #[test]
    fn rejects_missing_listing() {
        let errors = validate_lines(&[line(9, 1)], &HashMap::new());
        assert_eq!(errors, vec!["Item with ID 9 not found".to_owned()]);
    }

    #[test]
    fn aggregates_every_invalid_line() {
        // One missing listing and one over-stock line: both reported, so the
        // buyer learns everything wrong with the cart in one round-trip.
        let listings = HashMap::from([listing(1, 1)]);
        let errors = validate_lines(&[line(1, 5), line(9, 1)], &listings);
        assert_eq!(errors.len(), 2);
    }
}
