//! Store-wide settings singleton.
//!
//! The settings row is written only from the admin settings screen and read
//! by checkout at session start. Its JSON representation is camelCase, but
//! every field also accepts its snake_case spelling so payloads produced by
//! older admin builds (or copied straight from the database) still load.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::Coordinates;
use crate::shipping::{ShippingMethod, default_static_methods, shipping_cost};
use crate::types::CurrencyCode;

/// Reasons a settings payload is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsValidationError {
    #[error("{0} must be a finite number")]
    NotFinite(&'static str),
    #[error("{0} cannot be negative")]
    Negative(&'static str),
    #[error("shipping origin needs both latitude and longitude")]
    PartialOrigin,
    #[error("store name cannot be empty")]
    EmptyStoreName,
    #[error("static shipping method {0:?} has a negative price")]
    NegativeMethodPrice(String),
    #[error("static shipping method id {0:?} is reserved")]
    ReservedMethodId(String),
}

/// Shipping configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingSettings {
    #[serde(default, alias = "enable_dynamic_shipping")]
    pub enable_dynamic_shipping: bool,
    #[serde(default, alias = "shipping_base_fee")]
    pub shipping_base_fee: f64,
    #[serde(default, alias = "shipping_price_per_km")]
    pub shipping_price_per_km: f64,
    #[serde(default, alias = "shipping_origin_lat")]
    pub shipping_origin_lat: Option<f64>,
    #[serde(default, alias = "shipping_origin_lng")]
    pub shipping_origin_lng: Option<f64>,
    #[serde(
        default = "default_static_methods",
        alias = "static_shipping_methods",
        alias = "shipping_methods"
    )]
    pub static_methods: Vec<ShippingMethod>,
}

impl Default for ShippingSettings {
    fn default() -> Self {
        Self {
            enable_dynamic_shipping: false,
            shipping_base_fee: 0.0,
            shipping_price_per_km: 0.0,
            shipping_origin_lat: None,
            shipping_origin_lng: None,
            static_methods: default_static_methods(),
        }
    }
}

impl ShippingSettings {
    /// Warehouse location, only when both coordinates are configured.
    #[must_use]
    pub const fn origin(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.shipping_origin_lat, self.shipping_origin_lng)
    }

    /// Whether a dynamic quote can be attempted at all.
    #[must_use]
    pub const fn dynamic_enabled(&self) -> bool {
        self.enable_dynamic_shipping && self.origin().is_some()
    }

    /// Apply the configured rates to a distance.
    #[must_use]
    pub fn cost_for(&self, distance_km: f64) -> i64 {
        shipping_cost(
            distance_km,
            self.shipping_base_fee,
            self.shipping_price_per_km,
        )
    }

    /// # Errors
    ///
    /// Returns the first problem found in the shipping block.
    pub fn validate(&self) -> Result<(), SettingsValidationError> {
        check_amount("shippingBaseFee", self.shipping_base_fee)?;
        check_amount("shippingPricePerKm", self.shipping_price_per_km)?;

        match (self.shipping_origin_lat, self.shipping_origin_lng) {
            (Some(lat), Some(lng)) => {
                check_finite("shippingOriginLat", lat)?;
                check_finite("shippingOriginLng", lng)?;
            }
            (None, None) => {}
            _ => return Err(SettingsValidationError::PartialOrigin),
        }

        for method in &self.static_methods {
            if method.is_dynamic() {
                return Err(SettingsValidationError::ReservedMethodId(method.id.clone()));
            }
            if method.price < 0 {
                return Err(SettingsValidationError::NegativeMethodPrice(
                    method.id.clone(),
                ));
            }
        }
        Ok(())
    }
}

/// Payment method toggles shown at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSettings {
    #[serde(default = "enabled", alias = "enable_transfer")]
    pub enable_transfer: bool,
    #[serde(default, alias = "enable_card")]
    pub enable_card: bool,
    #[serde(default, alias = "enable_cash_on_delivery")]
    pub enable_cash_on_delivery: bool,
}

impl Default for PaymentSettings {
    fn default() -> Self {
        Self {
            enable_transfer: true,
            enable_card: false,
            enable_cash_on_delivery: false,
        }
    }
}

const fn enabled() -> bool {
    true
}

fn default_store_name() -> String {
    "Tienda".to_owned()
}

/// The settings singleton.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSettings {
    #[serde(default = "default_store_name", alias = "store_name")]
    pub store_name: String,
    #[serde(default)]
    pub currency: CurrencyCode,
    #[serde(flatten)]
    pub shipping: ShippingSettings,
    #[serde(flatten)]
    pub payments: PaymentSettings,
    #[serde(default, alias = "updated_at", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            store_name: default_store_name(),
            currency: CurrencyCode::default(),
            shipping: ShippingSettings::default(),
            payments: PaymentSettings::default(),
            updated_at: None,
        }
    }
}

impl StoreSettings {
    /// # Errors
    ///
    /// Returns the first problem found in the payload.
    pub fn validate(&self) -> Result<(), SettingsValidationError> {
        if self.store_name.trim().is_empty() {
            return Err(SettingsValidationError::EmptyStoreName);
        }
        self.shipping.validate()
    }
}

fn check_finite(field: &'static str, value: f64) -> Result<(), SettingsValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SettingsValidationError::NotFinite(field))
    }
}

fn check_amount(field: &'static str, value: f64) -> Result<(), SettingsValidationError> {
    check_finite(field, value)?;
    if value < 0.0 {
        return Err(SettingsValidationError::Negative(field));
    }
    Ok(())
}
