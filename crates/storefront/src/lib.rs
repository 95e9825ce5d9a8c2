//! Tienda Storefront library.
//!
//! Store settings and the checkout shipping pipeline behind an Axum API:
//! address resolution, road distance, and the distance-priced shipping
//! method. Exposed as a library so the binary, the CLI and tests share it.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod geocoding;
pub mod http;
pub mod middleware;
pub mod routes;
pub mod routing;
pub mod services;
pub mod state;

use axum::{Router, body::Body, http::Request};
use tower_http::trace::TraceLayer;

use crate::config::MapsConfig;
use crate::geocoding::AddressResolver;
use crate::routing::{DistanceCalculator, RoutingError};
use crate::services::ShippingPipeline;
use crate::state::AppState;

/// Build the shipping pipeline from map provider configuration.
///
/// # Errors
///
/// Returns error if the routing HTTP client fails to build.
pub fn build_pipeline(maps: &MapsConfig) -> Result<ShippingPipeline, RoutingError> {
    let resolver = AddressResolver::from_config(maps);
    tracing::info!(providers = ?resolver.provider_names(), "geocoding providers configured");
    let distance = DistanceCalculator::from_config(maps)?;
    Ok(ShippingPipeline::new(resolver, distance))
}

/// The full application router with its middleware stack.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::routes())
        .with_state(state)
        .layer(axum::middleware::from_fn(
            middleware::request_id_middleware,
        ))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
            )
        }))
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
