//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET   /health                                   - Liveness check
//! GET   /health/ready                             - Readiness check (database)
//!
//! GET   /api/settings                             - Store settings
//! PATCH /api/settings                             - Replace store settings (admin)
//! GET   /api/settings/shipping                    - Shipping block only
//!
//! POST  /api/address/resolve                      - Resolve an address selection
//! GET   /api/address/suggest?q=                   - Autocomplete candidates
//!
//! POST  /api/checkout/{checkout_id}/shipping          - Run shipping pipeline
//! GET   /api/checkout/{checkout_id}/shipping          - Current methods
//! PUT   /api/checkout/{checkout_id}/shipping/selected - Select a method
//! ```

pub mod address;
pub mod checkout;
pub mod health;
pub mod settings;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

pub fn address_routes() -> Router<AppState> {
    Router::new()
        .route("/resolve", post(address::resolve))
        .route("/suggest", get(address::suggest))
}

pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/{checkout_id}/shipping",
            get(checkout::show).post(checkout::quote),
        )
        .route("/{checkout_id}/shipping/selected", put(checkout::select))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/api/settings", get(settings::show).patch(settings::update))
        .route("/api/settings/shipping", get(settings::shipping))
        .nest("/api/address", address_routes())
        .nest("/api/checkout", checkout_routes())
}
