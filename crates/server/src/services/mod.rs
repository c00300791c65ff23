//! Business services composing the repositories.
//!
//! - [`cart`] - cart mutation batches (add/update/remove) and raw reads
//! - [`pricing`] - enrichment of cart lines with live listing/seller data
//! - [`checkout`] - the checkout orchestrator

pub mod cart;
pub mod checkout;
pub mod pricing;

pub use cart::{CartError, CartService};
pub use checkout::{CheckoutError, CheckoutReceipt, CheckoutService};
