//! OSRM route service client.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use tienda_core::Coordinates;

use super::{DistanceProvider, RouteEstimate, RoutingError, format_duration};
use crate::config::MapsConfig;
use crate::http::build_client;

/// OSRM `/route/v1/driving` client.
#[derive(Clone)]
pub struct OsrmRouter {
    client: reqwest::Client,
    base_url: String,
}

impl OsrmRouter {
    /// Create a new OSRM client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(maps: &MapsConfig) -> Result<Self, RoutingError> {
        Ok(Self {
            client: build_client(maps).map_err(RoutingError::http)?,
            base_url: maps.osrm_base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// OSRM takes `lng,lat` pairs separated by `;`.
    fn route_url(&self, origin: Coordinates, destination: Coordinates) -> String {
        format!(
            "{}/route/v1/driving/{},{};{},{}",
            self.base_url, origin.lng, origin.lat, destination.lng, destination.lat
        )
    }
}

#[async_trait]
impl DistanceProvider for OsrmRouter {
    fn name(&self) -> &'static str {
        "osrm"
    }

    #[instrument(skip(self))]
    async fn route(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> Result<RouteEstimate, RoutingError> {
        let response = self
            .client
            .get(self.route_url(origin, destination))
            .query(&[("overview", "false")])
            .send()
            .await
            .map_err(RoutingError::http)?;
        let status = response.status();

        // OSRM answers 400 with a JSON body for `NoRoute` and friends.
        if status.is_server_error() {
            let message = response.text().await.unwrap_or_default();
            return Err(RoutingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: RouteResponse = response
            .json()
            .await
            .map_err(|e| RoutingError::Parse(e.without_url().to_string()))?;
        body.into_estimate()
    }
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    code: String,
    #[serde(default)]
    routes: Vec<Route>,
}

#[derive(Debug, Deserialize)]
struct Route {
    /// Meters.
    distance: f64,
    /// Seconds.
    duration: f64,
}

impl RouteResponse {
    fn into_estimate(self) -> Result<RouteEstimate, RoutingError> {
        match self.code.as_str() {
            "Ok" => {}
            "NoRoute" => return Err(RoutingError::NoRoute),
            _ => return Err(RoutingError::Provider(self.code)),
        }
        let route = self.routes.into_iter().next().ok_or(RoutingError::NoRoute)?;
        Ok(RouteEstimate {
            distance_km: route.distance / 1000.0,
            duration_text: format_duration(route.duration),
        })
    }
}
