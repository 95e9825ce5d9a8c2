//! `OpenStreetMap` Nominatim client.
//!
//! Used as the free fallback when no Google key is configured. The public
//! instance requires an identifying User-Agent and allows roughly one
//! request per second.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use tienda_core::{AddressResult, Coordinates};

use super::{GeocodingError, Geocoder};
use crate::config::MapsConfig;
use crate::http::build_client;

/// Maximum suggestions requested per search.
const SEARCH_LIMIT: &str = "5";

/// Nominatim search and reverse client.
#[derive(Clone)]
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
    country: Option<String>,
}

impl NominatimGeocoder {
    /// Create a new Nominatim geocoder.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(maps: &MapsConfig) -> Result<Self, GeocodingError> {
        Ok(Self {
            client: build_client(maps).map_err(GeocodingError::http)?,
            base_url: maps.nominatim_base_url.trim_end_matches('/').to_owned(),
            country: maps.country.as_ref().map(|c| c.to_lowercase()),
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
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    fn name(&self) -> &'static str {
        "nominatim"
    }

    #[instrument(skip(self))]
    async fn geocode(&self, query: &str) -> Result<Vec<AddressResult>, GeocodingError> {
        let mut params = vec![
            ("q", query),
            ("format", "jsonv2"),
            ("addressdetails", "1"),
            ("limit", SEARCH_LIMIT),
        ];
        if let Some(ref country) = self.country {
            params.push(("countrycodes", country.as_str()));
        }
        let places: Vec<Place> = self.get("search", &params).await?;
        places.into_iter().map(AddressResult::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn reverse(&self, at: Coordinates) -> Result<Option<AddressResult>, GeocodingError> {
        let lat = at.lat.to_string();
        let lon = at.lng.to_string();
        let response: ReverseResponse = self
            .get(
                "reverse",
                &[
                    ("lat", lat.as_str()),
                    ("lon", lon.as_str()),
                    ("format", "jsonv2"),
                    ("addressdetails", "1"),
                ],
            )
            .await?;
        response.into_result()
    }
}

// =============================================================================
// Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct Place {
    display_name: String,
    lat: String,
    lon: String,
    #[serde(default)]
    address: PlaceAddress,
}

#[derive(Debug, Default, Deserialize)]
struct PlaceAddress {
    road: Option<String>,
    house_number: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    suburb: Option<String>,
    state: Option<String>,
    postcode: Option<String>,
    country: Option<String>,
}

/// `/reverse` answers `{"error": "Unable to geocode"}` with HTTP 200 when
/// nothing is near the point.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReverseResponse {
    Error { error: String },
    Place(Place),
}

impl ReverseResponse {
    fn into_result(self) -> Result<Option<AddressResult>, GeocodingError> {
        match self {
            Self::Error { error } => {
                tracing::debug!(%error, "nominatim reverse found nothing");
                Ok(None)
            }
            Self::Place(place) => AddressResult::try_from(place).map(Some),
        }
    }
}

fn parse_degrees(value: &str, field: &str) -> Result<f64, GeocodingError> {
    value
        .parse()
        .map_err(|_| GeocodingError::Parse(format!("invalid {field}: {value:?}")))
}

impl TryFrom<Place> for AddressResult {
    type Error = GeocodingError;

    fn try_from(place: Place) -> Result<Self, Self::Error> {
        let lat = parse_degrees(&place.lat, "lat")?;
        let lng = parse_degrees(&place.lon, "lon")?;
        let address = place.address;

        Ok(Self {
            formatted_address: place.display_name,
            street: address.road,
            number: address.house_number,
            city: address
                .city
                .or(address.town)
                .or(address.village)
                .or(address.suburb),
            state: address.state,
            postal_code: address.postcode,
            country: address.country,
            lat: Some(lat),
            lng: Some(lng),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_BODY: &str = r#"[{
        "place_id": 12345,
        "lat": "-33.4172",
        "lon": "-70.6064",
        "display_name": "1234, Avenida Providencia, Providencia, Santiago, Región Metropolitana de Santiago, 7500000, Chile",
        "address": {
            "house_number": "1234",
            "road": "Avenida Providencia",
            "suburb": "Providencia",
            "city": "Santiago",
            "state": "Región Metropolitana de Santiago",
            "postcode": "7500000",
            "country": "Chile",
            "country_code": "cl"
        }
    }]"#;

    #[test]
    fn parses_search_results_with_string_coordinates() {
        let places: Vec<Place> = serde_json::from_str(SEARCH_BODY).unwrap_or_default();
        let results: Result<Vec<AddressResult>, _> =
            places.into_iter().map(AddressResult::try_from).collect();
        let results = results.unwrap_or_default();

        assert_eq!(results.len(), 1);
        let address = &results[0];
        assert_eq!(address.street.as_deref(), Some("Avenida Providencia"));
        assert_eq!(address.number.as_deref(), Some("1234"));
        assert_eq!(address.city.as_deref(), Some("Santiago"));
        assert_eq!(address.postal_code.as_deref(), Some("7500000"));
        assert_eq!(
            address.coordinates(),
            Some(Coordinates::new(-33.4172, -70.6064))
        );
    }

    #[test]
    fn town_used_when_city_missing() {
        let body = r#"{
            "lat": "-33.3167", "lon": "-71.4167",
            "display_name": "Casablanca, Valparaíso, Chile",
            "address": {"town": "Casablanca", "state": "Valparaíso"}
        }"#;
        let place: Result<Place, _> = serde_json::from_str(body);
        let address = place.map_err(|e| GeocodingError::Parse(e.to_string()));
        let address = address.and_then(AddressResult::try_from);
        assert!(matches!(address, Ok(ref a) if a.city.as_deref() == Some("Casablanca")));
    }

    #[test]
    fn reverse_error_body_is_no_match() {
        let response: Result<ReverseResponse, _> =
            serde_json::from_str(r#"{"error":"Unable to geocode"}"#);
        assert!(matches!(
            response.map(ReverseResponse::into_result),
            Ok(Ok(None))
        ));
    }

    #[test]
    fn reverse_place_body_is_parsed() {
        let body = r#"{
            "lat": "-33.5", "lon": "-70.6",
            "display_name": "Las Condes, Chile",
            "address": {"city": "Las Condes"}
        }"#;
        let response: Result<ReverseResponse, _> = serde_json::from_str(body);
        match response.map(ReverseResponse::into_result) {
            Ok(Ok(Some(address))) => assert_eq!(address.city.as_deref(), Some("Las Condes")),
            other => panic!("expected address, got {other:?}"),
        }
    }

    #[test]
    fn garbage_coordinates_are_a_parse_error() {
        let place = Place {
            display_name: "Nowhere".to_owned(),
            lat: "north".to_owned(),
            lon: "-70.6".to_owned(),
            address: PlaceAddress::default(),
        };
        assert!(matches!(
            AddressResult::try_from(place),
            Err(GeocodingError::Parse(_))
        ));
    }
}
