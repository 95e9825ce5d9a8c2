//! Road distance between the store origin and a delivery address.
//!
//! Two providers are supported: the Google Distance Matrix API when
//! `GOOGLE_MAPS_API_KEY` is set, and a public OSRM server otherwise.
//! Callers only ever see a [`DistanceOutcome`]; provider errors are turned
//! into `DistanceOutcome::Failure` and never propagate.

mod google;
mod osrm;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::instrument;

use tienda_core::{Coordinates, DistanceOutcome};

use crate::config::MapsConfig;

pub use google::GoogleDistanceMatrix;
pub use osrm::OsrmRouter;

/// Errors from a routing provider.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// HTTP request failed (URL stripped so API keys never reach logs).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with a non-success HTTP status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Provider reported a failure status in the body.
    #[error("provider status {0}")]
    Provider(String),

    /// No route exists between the two points.
    #[error("no route found")]
    NoRoute,

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl RoutingError {
    pub(crate) fn http(err: reqwest::Error) -> Self {
        Self::Http(err.without_url())
    }
}

/// A successful route lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteEstimate {
    pub distance_km: f64,
    pub duration_text: String,
}

impl From<RouteEstimate> for DistanceOutcome {
    fn from(route: RouteEstimate) -> Self {
        Self::Success {
            distance_km: route.distance_km,
            duration_text: route.duration_text,
        }
    }
}

/// A road routing provider.
#[async_trait]
pub trait DistanceProvider: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &'static str;

    /// Driving route between two points.
    async fn route(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> Result<RouteEstimate, RoutingError>;

    /// Like [`route`](Self::route), folding errors into a failure outcome.
    async fn distance(&self, origin: Coordinates, destination: Coordinates) -> DistanceOutcome {
        match self.route(origin, destination).await {
            Ok(route) => route.into(),
            Err(e) => DistanceOutcome::failure(e.to_string()),
        }
    }
}

/// Distance calculator used by the checkout pipeline.
#[derive(Clone)]
pub struct DistanceCalculator {
    provider: Arc<dyn DistanceProvider>,
}

impl DistanceCalculator {
    #[must_use]
    pub fn new(provider: Arc<dyn DistanceProvider>) -> Self {
        Self { provider }
    }

    /// Google when a key is configured, OSRM otherwise.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn from_config(maps: &MapsConfig) -> Result<Self, RoutingError> {
        let provider: Arc<dyn DistanceProvider> = match &maps.google_api_key {
            Some(key) => Arc::new(GoogleDistanceMatrix::new(maps, key.clone())?),
            None => Arc::new(OsrmRouter::new(maps)?),
        };
        tracing::info!(provider = provider.name(), "distance provider configured");
        Ok(Self { provider })
    }

    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Road distance from `origin` to `destination`.
    #[instrument(skip(self), fields(provider = self.provider.name()))]
    pub async fn distance(&self, origin: Coordinates, destination: Coordinates) -> DistanceOutcome {
        let outcome = self.provider.distance(origin, destination).await;
        if let DistanceOutcome::Failure { error } = &outcome {
            tracing::warn!(%error, "distance lookup failed");
        }
        outcome
    }
}

/// Render a duration in seconds the way Google's `duration.text` reads.
///
/// Rounds to the nearest minute, with a floor of one minute.
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let minutes = ((seconds / 60.0).round() as u64).max(1);
    let (hours, minutes) = (minutes / 60, minutes % 60);
    match (hours, minutes) {
        (0, m) => format!("{m} min"),
        (h, 0) => format!("{h} h"),
        (h, m) => format!("{h} h {m} min"),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted distance provider for tests.

    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    pub struct FakeDistance {
        pub result: Result<RouteEstimate, String>,
        pub calls: AtomicUsize,
    }

    impl FakeDistance {
        pub fn km(distance_km: f64) -> Self {
            Self {
                result: Ok(RouteEstimate {
                    distance_km,
                    duration_text: "18 min".to_owned(),
                }),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn failing(status: &str) -> Self {
            Self {
                result: Err(status.to_owned()),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::Relaxed)
        }
    }

    #[async_trait]
    impl DistanceProvider for FakeDistance {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn route(
            &self,
            _origin: Coordinates,
            _destination: Coordinates,
        ) -> Result<RouteEstimate, RoutingError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            self.result
                .clone()
                .map_err(RoutingError::Provider)
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::testing::FakeDistance;
    use super::*;

    #[rstest]
    #[case(0.0, "1 min")]
    #[case(29.0, "1 min")]
    #[case(720.0, "12 min")]
    #[case(3600.0, "1 h")]
    #[case(3900.0, "1 h 5 min")]
    #[case(7410.0, "2 h 4 min")]
    fn test_format_duration(#[case] seconds: f64, #[case] expected: &str) {
        assert_eq!(format_duration(seconds), expected);
    }

    #[tokio::test]
    async fn provider_error_becomes_failure_outcome() {
        let calculator = DistanceCalculator::new(Arc::new(FakeDistance::failing("NOT_FOUND")));

        let outcome = calculator
            .distance(Coordinates::new(-33.45, -70.66), Coordinates::new(-33.50, -70.60))
            .await;

        assert_eq!(outcome, DistanceOutcome::failure("provider status NOT_FOUND"));
    }

    #[tokio::test]
    async fn route_becomes_success_outcome() {
        let calculator = DistanceCalculator::new(Arc::new(FakeDistance::km(5.2)));

        let outcome = calculator
            .distance(Coordinates::new(-33.45, -70.66), Coordinates::new(-33.50, -70.60))
            .await;

        assert_eq!(
            outcome,
            DistanceOutcome::Success {
                distance_km: 5.2,
                duration_text: "18 min".to_owned(),
            }
        );
    }

    #[test]
    fn osrm_is_the_default_without_a_key() {
        let calculator = DistanceCalculator::from_config(&MapsConfig::default());
        assert!(matches!(calculator, Ok(ref c) if c.provider_name() == "osrm"));
    }
}
