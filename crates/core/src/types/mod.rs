//! Core types for Tienda.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod checkout;
pub mod id;
pub mod price;

pub use checkout::{CheckoutToken, CheckoutTokenError};
pub use id::SettingsId;
pub use price::{CurrencyCode, Price};
