//! Google Distance Matrix client.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::instrument;

use tienda_core::Coordinates;

use super::{DistanceProvider, RouteEstimate, RoutingError};
use crate::config::MapsConfig;
use crate::http::build_client;

const DISTANCE_MATRIX_URL: &str = "https://maps.googleapis.com/maps/api/distancematrix/json";

/// Single origin, single destination Distance Matrix lookups.
#[derive(Clone)]
pub struct GoogleDistanceMatrix {
    client: reqwest::Client,
    api_key: SecretString,
}

impl GoogleDistanceMatrix {
    /// Create a new Distance Matrix client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(maps: &MapsConfig, api_key: SecretString) -> Result<Self, RoutingError> {
        Ok(Self {
            client: build_client(maps).map_err(RoutingError::http)?,
            api_key,
        })
    }
}

#[async_trait]
impl DistanceProvider for GoogleDistanceMatrix {
    fn name(&self) -> &'static str {
        "google"
    }

    #[instrument(skip(self))]
    async fn route(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> Result<RouteEstimate, RoutingError> {
        let origins = format!("{},{}", origin.lat, origin.lng);
        let destinations = format!("{},{}", destination.lat, destination.lng);

        let response = self
            .client
            .get(DISTANCE_MATRIX_URL)
            .query(&[
                ("origins", origins.as_str()),
                ("destinations", destinations.as_str()),
                ("mode", "driving"),
                ("units", "metric"),
                ("key", self.api_key.expose_secret()),
            ])
            .send()
            .await
            .map_err(RoutingError::http)?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RoutingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let matrix: MatrixResponse = response
            .json()
            .await
            .map_err(|e| RoutingError::Parse(e.without_url().to_string()))?;
        matrix.into_estimate()
    }
}

// =============================================================================
// Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    status: String,
    #[serde(default)]
    rows: Vec<MatrixRow>,
}

#[derive(Debug, Deserialize)]
struct MatrixRow {
    #[serde(default)]
    elements: Vec<MatrixElement>,
}

#[derive(Debug, Deserialize)]
struct MatrixElement {
    status: String,
    distance: Option<TextValue>,
    duration: Option<TextValue>,
}

#[derive(Debug, Deserialize)]
struct TextValue {
    text: String,
    value: f64,
}

impl MatrixResponse {
    fn into_estimate(self) -> Result<RouteEstimate, RoutingError> {
        if self.status != "OK" {
            return Err(RoutingError::Provider(self.status));
        }

        let element = self
            .rows
            .into_iter()
            .next()
            .and_then(|row| row.elements.into_iter().next())
            .ok_or_else(|| RoutingError::Parse("empty distance matrix".to_owned()))?;

        match element.status.as_str() {
            "OK" => {}
            "ZERO_RESULTS" | "NOT_FOUND" => return Err(RoutingError::NoRoute),
            _ => return Err(RoutingError::Provider(element.status)),
        }

        let (Some(distance), Some(duration)) = (element.distance, element.duration) else {
            return Err(RoutingError::Parse(
                "element missing distance or duration".to_owned(),
            ));
        };

        Ok(RouteEstimate {
            distance_km: distance.value / 1000.0,
            duration_text: duration.text,
        })
    }
}
