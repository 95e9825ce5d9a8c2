//! Business logic services for storefront.
//!
//! # Services
//!
//! - `shipping` - Checkout shipping pipeline (address → distance → cost)
//!   and per-checkout shipping state

pub mod shipping;

pub use shipping::{
    CheckoutShipping, CheckoutShippingStore, DISTANCE_UNAVAILABLE, ShippingPipeline, ShippingQuote,
};
