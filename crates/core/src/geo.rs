//! Geographic coordinates and resolved postal addresses.

use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in decimal degrees.
///
/// No bounds checking is performed: the geocoding and routing providers
/// are the only producers and consumers of these values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Build a pair only when both components are present.
    #[must_use]
    pub const fn from_parts(lat: Option<f64>, lng: Option<f64>) -> Option<Self> {
        match (lat, lng) {
            (Some(lat), Some(lng)) => Some(Self { lat, lng }),
            _ => None,
        }
    }
}

/// A structured address produced by the address resolver.
///
/// Every component except `formatted_address` is optional because
/// providers return different levels of detail.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressResult {
    pub formatted_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "postal")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
}

impl AddressResult {
    /// An address with only the formatted line set.
    #[must_use]
    pub fn unstructured(formatted_address: impl Into<String>) -> Self {
        Self {
            formatted_address: formatted_address.into(),
            ..Self::default()
        }
    }

    /// Coordinates of the address, if the provider returned both.
    #[must_use]
    pub const fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.lat, self.lng)
    }

    /// Street line such as `"Av. Providencia 1234"`.
    ///
    /// Falls back to the formatted address when no street was parsed.
    #[must_use]
    pub fn street_line(&self) -> String {
        match (&self.street, &self.number) {
            (Some(street), Some(number)) => format!("{street} {number}"),
            (Some(street), None) => street.clone(),
            _ => self.formatted_address.clone(),
        }
    }
}

/// Checkout shipping form state, flattened from an [`AddressResult`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfo {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub phone: String,
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
}

impl ShippingInfo {
    /// Copy the address fields of a resolved address into the form,
    /// keeping the contact fields the customer already typed.
    #[must_use]
    pub fn with_address(mut self, address: &AddressResult) -> Self {
        self.address = address.street_line();
        self.city = address.city.clone().unwrap_or_default();
        self.region = address.state.clone().unwrap_or_default();
        self.postal_code = address.postal_code.clone().unwrap_or_default();
        self.lat = address.lat;
        self.lng = address.lng;
        self
    }

    /// Build a form from a resolved address with empty contact fields.
    #[must_use]
    pub fn from_address(address: &AddressResult) -> Self {
        Self::default().with_address(address)
    }

    #[must_use]
    pub const fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.lat, self.lng)
    }
}
