//! Domain types for the marketplace.
//!
//! These are validated domain objects, separate from database row types and
//! request payloads. Wire names follow the public API contract (`itemID`,
//! `buyerID`, ...), set via serde renames.

pub mod cart;
pub mod listing;
pub mod notification;
pub mod principal;
pub mod review;
pub mod transaction;
pub mod user;

pub use cart::{CartLine, EnrichedCart, EnrichedLine};
pub use listing::{Listing, ListingDetail, ListingSummary, ListingWithSeller};
pub use notification::{Notification, NotificationItem};
pub use principal::Principal;
pub use review::{Review, ReviewView, ReviewWithContext, UserReview};
pub use transaction::Transaction;
pub use user::User;
