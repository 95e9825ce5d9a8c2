//! Address resolution.
//!
//! Turns free text or an autocomplete pick into an [`AddressResult`] with
//! coordinates, using an ordered chain of geocoding providers:
//!
//! 1. Google Geocoding / Place Details (when `GOOGLE_MAPS_API_KEY` is set)
//! 2. `OpenStreetMap` Nominatim text search (free tier fallback)
//!
//! Resolution never fails from the caller's point of view. When every
//! provider errors or returns nothing, the raw text comes back as
//! [`Resolution::Unresolved`]: the address has no coordinates and dynamic
//! shipping is simply skipped downstream.

mod google;
mod nominatim;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use tienda_core::{AddressResult, Coordinates};

use crate::config::MapsConfig;

pub use google::GoogleGeocoder;
pub use nominatim::NominatimGeocoder;

/// Errors from a single geocoding provider.
#[derive(Debug, Error)]
pub enum GeocodingError {
    /// HTTP request failed (URL stripped so API keys never reach logs).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with a non-success HTTP status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Provider answered 200 but reported a failure status
    /// (`REQUEST_DENIED`, `OVER_QUERY_LIMIT`, ...).
    #[error("provider status {status}: {message}")]
    Provider { status: String, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The provider cannot serve this kind of lookup.
    #[error("{0} is not supported by this provider")]
    Unsupported(&'static str),
}

impl GeocodingError {
    pub(crate) fn http(err: reqwest::Error) -> Self {
        Self::Http(err.without_url())
    }
}

/// A geocoding provider.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &'static str;

    /// Forward-geocode free text. An empty vector means no match.
    async fn geocode(&self, query: &str) -> Result<Vec<AddressResult>, GeocodingError>;

    /// Reverse-geocode a coordinate pair.
    async fn reverse(&self, at: Coordinates) -> Result<Option<AddressResult>, GeocodingError>;

    /// Look up an autocomplete place id.
    async fn place_details(&self, place_id: &str) -> Result<Option<AddressResult>, GeocodingError> {
        let _ = place_id;
        Err(GeocodingError::Unsupported("place details"))
    }
}

/// What the customer picked or typed in the address field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum AddressSelection {
    /// Free text typed into the field.
    Text { query: String },
    /// An autocomplete suggestion.
    Place {
        place_id: String,
        #[serde(default)]
        description: Option<String>,
    },
    /// A pin dropped on a map or the browser's current location.
    Coordinates { lat: f64, lng: f64 },
}

impl AddressSelection {
    /// The text to fall back to when resolution fails.
    #[must_use]
    pub fn raw_text(&self) -> String {
        match self {
            Self::Text { query } => query.trim().to_owned(),
            Self::Place { description, .. } => description.clone().unwrap_or_default(),
            Self::Coordinates { lat, lng } => format_coordinates(Coordinates::new(*lat, *lng)),
        }
    }
}

/// Outcome of resolving an [`AddressSelection`].
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Structured address, usually with coordinates.
    Resolved(AddressResult),
    /// No provider could resolve it; the raw text is kept as-is.
    Unresolved(String),
}

impl Resolution {
    #[must_use]
    pub const fn address(&self) -> Option<&AddressResult> {
        match self {
            Self::Resolved(address) => Some(address),
            Self::Unresolved(_) => None,
        }
    }

    #[must_use]
    pub const fn coordinates(&self) -> Option<Coordinates> {
        match self {
            Self::Resolved(address) => address.coordinates(),
            Self::Unresolved(_) => None,
        }
    }

    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// Formatted address when resolved, raw text otherwise.
    #[must_use]
    pub fn display_text(&self) -> &str {
        match self {
            Self::Resolved(address) => &address.formatted_address,
            Self::Unresolved(raw) => raw,
        }
    }
}

fn format_coordinates(at: Coordinates) -> String {
    format!("{:.6}, {:.6}", at.lat, at.lng)
}

/// Ordered chain of geocoding providers with silent degradation.
#[derive(Clone, Default)]
pub struct AddressResolver {
    providers: Vec<Arc<dyn Geocoder>>,
}

impl AddressResolver {
    #[must_use]
    pub const fn new(providers: Vec<Arc<dyn Geocoder>>) -> Self {
        Self { providers }
    }

    /// Build the provider chain from configuration.
    ///
    /// A provider whose client cannot be constructed is left out with a
    /// warning, in the worst case leaving an empty chain that never resolves.
    #[must_use]
    pub fn from_config(maps: &MapsConfig) -> Self {
        let mut providers: Vec<Arc<dyn Geocoder>> = Vec::new();

        if let Some(key) = &maps.google_api_key {
            match GoogleGeocoder::new(maps, key.clone()) {
                Ok(google) => providers.push(Arc::new(google)),
                Err(e) => tracing::warn!(error = %e, "Google geocoder unavailable"),
            }
        }

        if maps.nominatim_enabled {
            match NominatimGeocoder::new(maps) {
                Ok(nominatim) => providers.push(Arc::new(nominatim)),
                Err(e) => tracing::warn!(error = %e, "Nominatim geocoder unavailable"),
            }
        }

        if providers.is_empty() {
            tracing::warn!("no geocoding provider configured; addresses will not be resolved");
        }

        Self { providers }
    }

    /// Names of the configured providers, in order.
    #[must_use]
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Resolve a selection.
    #[instrument(skip(self))]
    pub async fn resolve(&self, selection: &AddressSelection) -> Resolution {
        match selection {
            AddressSelection::Text { query } => self.resolve_text(query).await,
            AddressSelection::Place {
                place_id,
                description,
            } => {
                if let Some(address) = self.place_details(place_id).await {
                    return Resolution::Resolved(address);
                }
                match description {
                    Some(text) => self.resolve_text(text).await,
                    None => Resolution::Unresolved(String::new()),
                }
            }
            AddressSelection::Coordinates { lat, lng } => {
                let at = Coordinates::new(*lat, *lng);
                let address = self
                    .reverse(at)
                    .await
                    .unwrap_or_else(|| AddressResult::unstructured(format_coordinates(at)));
                // The pin itself is authoritative, not the provider's snapped point.
                Resolution::Resolved(AddressResult {
                    lat: Some(at.lat),
                    lng: Some(at.lng),
                    ..address
                })
            }
        }
    }

    /// Resolve free text to its best match.
    pub async fn resolve_text(&self, query: &str) -> Resolution {
        let query = query.trim();
        if query.is_empty() {
            return Resolution::Unresolved(String::new());
        }
        self.suggest(query)
            .await
            .into_iter()
            .next()
            .map_or_else(|| Resolution::Unresolved(query.to_owned()), Resolution::Resolved)
    }

    /// Candidate addresses for autocomplete, from the first provider that
    /// returns any.
    pub async fn suggest(&self, query: &str) -> Vec<AddressResult> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        for provider in &self.providers {
            match provider.geocode(query).await {
                Ok(results) if !results.is_empty() => return results,
                Ok(_) => {
                    tracing::debug!(provider = provider.name(), "no geocoding results");
                }
                Err(e) => {
                    tracing::warn!(provider = provider.name(), error = %e, "geocoding failed");
                }
            }
        }
        Vec::new()
    }

    async fn place_details(&self, place_id: &str) -> Option<AddressResult> {
        for provider in &self.providers {
            match provider.place_details(place_id).await {
                Ok(Some(address)) => return Some(address),
                Ok(None) | Err(GeocodingError::Unsupported(_)) => {}
                Err(e) => {
                    tracing::warn!(provider = provider.name(), error = %e, "place details failed");
                }
            }
        }
        None
    }

    async fn reverse(&self, at: Coordinates) -> Option<AddressResult> {
        for provider in &self.providers {
            match provider.reverse(at).await {
                Ok(Some(address)) => return Some(address),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(provider = provider.name(), error = %e, "reverse geocoding failed");
                }
            }
        }
        None
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted geocoder for tests.

    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Returns canned results, or fails every call when `fail` is set.
    #[derive(Default)]
    pub struct FakeGeocoder {
        pub results: Vec<AddressResult>,
        pub place: Option<AddressResult>,
        pub fail: bool,
        pub calls: AtomicUsize,
    }

    impl FakeGeocoder {
        pub fn returning(address: AddressResult) -> Self {
            Self {
                results: vec![address],
                ..Self::default()
            }
        }

        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn check(&self) -> Result<(), GeocodingError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            if self.fail {
                return Err(GeocodingError::Provider {
                    status: "REQUEST_DENIED".to_owned(),
                    message: "API key not valid".to_owned(),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl Geocoder for FakeGeocoder {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn geocode(&self, _query: &str) -> Result<Vec<AddressResult>, GeocodingError> {
            self.check()?;
            Ok(self.results.clone())
        }

        async fn reverse(&self, _at: Coordinates) -> Result<Option<AddressResult>, GeocodingError> {
            self.check()?;
            Ok(self.results.first().cloned())
        }

        async fn place_details(
            &self,
            _place_id: &str,
        ) -> Result<Option<AddressResult>, GeocodingError> {
            self.check()?;
            Ok(self.place.clone())
        }
    }

    pub fn las_condes() -> AddressResult {
        AddressResult {
            formatted_address: "Av. Apoquindo 4500, Las Condes, Chile".to_owned(),
            street: Some("Av. Apoquindo".to_owned()),
            number: Some("4500".to_owned()),
            city: Some("Las Condes".to_owned()),
            state: Some("Región Metropolitana".to_owned()),
            postal_code: None,
            country: Some("Chile".to_owned()),
            lat: Some(-33.50),
            lng: Some(-70.60),
        }
    }
}
