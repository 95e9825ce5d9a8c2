//! Unified error handling with Sentry integration.
//!
//! Handlers return `Result<T, AppError>`. Server-side failures are
//! captured to Sentry before the response is built; clients get a JSON
//! body `{"error": "..."}` that never carries internal details.
//!
//! Geocoding and routing failures do not appear here: the checkout
//! pipeline degrades instead of erroring.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use tienda_core::{CheckoutTokenError, SettingsValidationError, UnknownShippingMethod};

use crate::db::RepositoryError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Submitted settings failed validation.
    #[error("Invalid settings: {0}")]
    InvalidSettings(#[from] SettingsValidationError),

    /// Malformed checkout id in the path.
    #[error("Invalid checkout id: {0}")]
    InvalidCheckout(#[from] CheckoutTokenError),

    /// Selected shipping method is not offered for this checkout.
    #[error("Unknown shipping method: {0}")]
    UnknownMethod(#[from] UnknownShippingMethod),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or wrong admin credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidSettings(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InvalidCheckout(_) => StatusCode::BAD_REQUEST,
            Self::UnknownMethod(_) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Database(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(_) => "Internal server error".to_string(),
            Self::Unauthorized(_) => "Unauthorized".to_string(),
            _ => self.to_string(),
        };

        (self.status(), Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for checkout and admin actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("settings", "Shipping rates updated", Some(&[("base_fee", "3500")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
