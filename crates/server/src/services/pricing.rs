//! Cart enrichment: join raw cart lines with live listing and seller data.
//!
//! The same materialized view serves two callers: rendering `GET /cart` and
//! snapshotting the order at checkout. A line whose listing has been deleted
//! is skipped with a warning, never a hard error — the cart degrades rather
//! than breaking.

use std::collections::HashMap;

use sqlx::PgPool;

use resold_core::{ListingId, Price, UserId};

use crate::db::{ListingRepository, RepositoryError, UserRepository};
use crate::models::{CartLine, EnrichedCart, EnrichedLine, Listing};

/// Fetch live listing and seller data for `lines` and materialize the cart.
///
/// # Errors
///
/// Returns `RepositoryError` only for storage failures; missing listings and
/// sellers are tolerated (skipped line, "Unknown" seller).
pub async fn enrich_lines(
    pool: &PgPool,
    lines: &[CartLine],
) -> Result<EnrichedCart, RepositoryError> {
    let listings = ListingRepository::new(pool);
    let users = UserRepository::new(pool);

    let mut resolved: Vec<(CartLine, Listing)> = Vec::with_capacity(lines.len());
    for line in lines {
        match listings.find_by_id(line.listing_id).await? {
            Some(listing) => resolved.push((*line, listing)),
            None => {
                tracing::warn!(
                    listing = %line.listing_id,
                    "cart line skipped: listing no longer exists"
                );
            }
        }
    }

    let seller_ids: Vec<UserId> = resolved.iter().map(|(_, l)| l.seller_id).collect();
    let seller_names = users.display_names(&seller_ids).await?;

    Ok(materialize(resolved, &seller_names))
}

/// Build the enriched view from already-fetched data.
///
/// `price` on each line is the line total; `total` is their sum.
pub(crate) fn materialize(
    resolved: Vec<(CartLine, Listing)>,
    seller_names: &HashMap<UserId, String>,
) -> EnrichedCart {
    let cart: Vec<EnrichedLine> = resolved
        .into_iter()
        .map(|(line, listing)| EnrichedLine {
            listing_id: line.listing_id,
            quantity: line.quantity,
            name: listing.title,
            brand: listing.brand,
            image: listing.image,
            price: listing.price.line_total(line.quantity),
            seller_id: listing.seller_id,
            seller_name: seller_names
                .get(&listing.seller_id)
                .cloned()
                .unwrap_or_else(|| "Unknown".to_owned()),
        })
        .collect();

    let total: Price = cart.iter().map(|line| line.price).sum();

    EnrichedCart { cart, total }
}

/// Total number of items across all lines (the cart badge count).
#[must_use]
pub fn item_count(lines: &[CartLine]) -> i64 {
    lines.iter().map(|line| i64::from(line.quantity)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(id: i32, price_cents: i64, seller: i32) -> Listing {
        Listing {
            id: ListingId::new(id),
            title: format!("Phone {id}"),
            brand: "TestBrand".to_owned(),
            price: Price::from_cents(price_cents),
            stock: 10,
            image: "phone.jpg".to_owned(),
            seller_id: UserId::new(seller),
            disabled: false,
        }
    }

    fn line(id: i32, quantity: i32) -> CartLine {
        CartLine {
            listing_id: ListingId::new(id),
            quantity,
        }
    }

    #[test]
    fn total_is_sum_of_unit_price_times_quantity() {
        let resolved = vec![
            (line(1, 2), listing(1, 10_000, 7)), // 2 x $100
            (line(2, 3), listing(2, 5_000, 8)),  // 3 x $50
        ];
        let names = HashMap::from([(UserId::new(7), "Sam Seller".to_owned())]);

        let enriched = materialize(resolved, &names);

        assert_eq!(enriched.total, Price::from_cents(35_000));
        assert_eq!(enriched.cart.len(), 2);
        assert_eq!(enriched.cart[0].price, Price::from_cents(20_000));
        assert_eq!(enriched.cart[0].seller_name, "Sam Seller");
    }

    #[test]
    fn unknown_seller_gets_placeholder_name() {
        let enriched = materialize(vec![(line(1, 1), listing(1, 100, 99))], &HashMap::new());
        assert_eq!(enriched.cart[0].seller_name, "Unknown");
    }

    #[test]
    fn empty_cart_materializes_to_zero_total() {
        let enriched = materialize(Vec::new(), &HashMap::new());
        assert!(enriched.cart.is_empty());
        assert_eq!(enriched.total, Price::ZERO);
    }

    #[test]
    fn item_count_sums_quantities() {
        assert_eq!(item_count(&[line(1, 2), line(2, 5)]), 7);
        assert_eq!(item_count(&[]), 0);
    }
}
