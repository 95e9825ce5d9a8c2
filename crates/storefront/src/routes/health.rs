//! Health check endpoints.

use axum::{extract::State, http::StatusCode};

use crate::state::AppState;

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies database connectivity before returning OK.
/// Returns 503 Service Unavailable if the database is not reachable.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.settings().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use tienda_core::StoreSettings;

    use crate::geocoding::testing::FakeGeocoder;
    use crate::routes::test_support::{get, send};
    use crate::routing::testing::FakeDistance;
    use crate::state::testing::state;

    #[tokio::test]
    async fn liveness_and_readiness_are_ok() {
        let app = state(
            StoreSettings::default(),
            FakeGeocoder::default(),
            FakeDistance::km(1.0),
        );

        assert_eq!(send(app.clone(), get("/health")).await.status(), StatusCode::OK);
        assert_eq!(send(app, get("/health/ready")).await.status(), StatusCode::OK);
    }
}
