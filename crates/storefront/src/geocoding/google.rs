//! Google Geocoding and Place Details client.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::instrument;

use tienda_core::{AddressResult, Coordinates};

use super::{GeocodingError, Geocoder};
use crate::config::MapsConfig;
use crate::http::build_client;

/// Google Maps Platform base URL.
const BASE_URL: &str = "https://maps.googleapis.com/maps/api";

/// Fields requested from Place Details (billed per field group).
const PLACE_FIELDS: &str = "formatted_address,address_components,geometry";

/// Google Geocoding API client.
#[derive(Clone)]
pub struct GoogleGeocoder {
    client: reqwest::Client,
    api_key: SecretString,
    country: Option<String>,
    base_url: String,
}

impl GoogleGeocoder {
    /// Create a new Google geocoder.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(maps: &MapsConfig, api_key: SecretString) -> Result<Self, GeocodingError> {
        Ok(Self {
            client: build_client(maps).map_err(GeocodingError::http)?,
            api_key,
            country: maps.country.clone(),
            base_url: BASE_URL.to_owned(),
        })
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, GeocodingError> {
        let url = format!("{}/{path}", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.expose_secret())])
            .send()
            .await
            .map_err(GeocodingError::http)?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GeocodingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| GeocodingError::Parse(e.without_url().to_string()))
    }

    fn components(&self) -> Option<String> {
        self.country.as_ref().map(|c| format!("country:{c}"))
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    fn name(&self) -> &'static str {
        "google"
    }

    #[instrument(skip(self))]
    async fn geocode(&self, query: &str) -> Result<Vec<AddressResult>, GeocodingError> {
        let components = self.components();
        let mut params = vec![("address", query)];
        if let Some(ref c) = components {
            params.push(("components", c.as_str()));
        }
        let response: GeocodeResponse = self.get("geocode/json", &params).await?;
        response.into_results()
    }

    #[instrument(skip(self))]
    async fn reverse(&self, at: Coordinates) -> Result<Option<AddressResult>, GeocodingError> {
        let latlng = format!("{},{}", at.lat, at.lng);
        let response: GeocodeResponse = self
            .get("geocode/json", &[("latlng", latlng.as_str())])
            .await?;
        Ok(response.into_results()?.into_iter().next())
    }

    #[instrument(skip(self))]
    async fn place_details(&self, place_id: &str) -> Result<Option<AddressResult>, GeocodingError> {
        let response: PlaceDetailsResponse = self
            .get(
                "place/details/json",
                &[("place_id", place_id), ("fields", PLACE_FIELDS)],
            )
            .await?;
        response.into_result()
    }
}

// =============================================================================
// Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GoogleResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaceDetailsResponse {
    status: String,
    #[serde(default)]
    result: Option<GoogleResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleResult {
    formatted_address: String,
    #[serde(default)]
    address_components: Vec<AddressComponent>,
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
struct AddressComponent {
    long_name: String,
    #[serde(default)]
    types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

/// Map a Google status to results-or-error. `ZERO_RESULTS` and `NOT_FOUND`
/// are empty successes.
fn check_status(status: &str, error_message: Option<String>) -> Result<bool, GeocodingError> {
    match status {
        "OK" => Ok(true),
        "ZERO_RESULTS" | "NOT_FOUND" => Ok(false),
        other => Err(GeocodingError::Provider {
            status: other.to_owned(),
            message: error_message.unwrap_or_default(),
        }),
    }
}

impl GeocodeResponse {
    fn into_results(self) -> Result<Vec<AddressResult>, GeocodingError> {
        if !check_status(&self.status, self.error_message)? {
            return Ok(Vec::new());
        }
        Ok(self.results.into_iter().map(AddressResult::from).collect())
    }
}

impl PlaceDetailsResponse {
    fn into_result(self) -> Result<Option<AddressResult>, GeocodingError> {
        if !check_status(&self.status, self.error_message)? {
            return Ok(None);
        }
        Ok(self.result.map(AddressResult::from))
    }
}

impl GoogleResult {
    fn component(&self, kind: &str) -> Option<String> {
        self.address_components
            .iter()
            .find(|c| c.types.iter().any(|t| t == kind))
            .map(|c| c.long_name.clone())
    }
}

impl From<GoogleResult> for AddressResult {
    fn from(result: GoogleResult) -> Self {
        // Chilean comunas come back as `locality`, sometimes only as
        // `administrative_area_level_3` or `sublocality`.
        let city = result
            .component("locality")
            .or_else(|| result.component("administrative_area_level_3"))
            .or_else(|| result.component("sublocality"));

        Self {
            street: result.component("route"),
            number: result.component("street_number"),
            city,
            state: result.component("administrative_area_level_1"),
            postal_code: result.component("postal_code"),
            country: result.component("country"),
            lat: result.geometry.as_ref().map(|g| g.location.lat),
            lng: result.geometry.as_ref().map(|g| g.location.lng),
            formatted_address: result.formatted_address,
        }
    }
}
