//! Tienda Core - Shared domain types library.
//!
//! This crate provides the types used across all Tienda components:
//! - `storefront` - Public checkout and settings HTTP service
//! - `cli` - Command-line tools for migrations and settings management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients. The shipping cost formula lives here so
//! the service and the CLI price shipping identically.
//!
//! # Modules
//!
//! - [`geo`] - Coordinates, resolved addresses and the checkout shipping form
//! - [`shipping`] - Shipping methods, distance outcomes and the cost formula
//! - [`settings`] - The store settings singleton
//! - [`types`] - Newtype wrappers for IDs, prices and checkout tokens

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod geo;
pub mod settings;
pub mod shipping;
pub mod types;

pub use geo::{AddressResult, Coordinates, ShippingInfo};
pub use settings::{PaymentSettings, SettingsValidationError, ShippingSettings, StoreSettings};
pub use shipping::{
    DYNAMIC_METHOD_ID, DistanceOutcome, ShippingMethod, ShippingMethodList,
    UnknownShippingMethod, default_static_methods, shipping_cost,
};
pub use types::*;
