//! Admin bearer-token extractor.
//!
//! Settings writes are limited to store staff. The admin dashboard sends
//! `Authorization: Bearer <ADMIN_API_TOKEN>`; the token is compared in
//! constant time against the configured secret.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use secrecy::ExposeSecret;

use crate::error::AppError;
use crate::state::AppState;

/// Extractor that requires the admin API token.
///
/// # Example
///
/// ```rust,ignore
/// async fn update_settings(
///     _admin: RequireAdmin,
///     State(state): State<AppState>,
/// ) -> Result<Json<StoreSettings>> {
///     // ...
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RequireAdmin;

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(bearer_token)
            .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;

        if !constant_time_compare(token, state.config().admin_api_token.expose_secret()) {
            tracing::warn!(path = %parts.uri.path(), "rejected admin request with wrong token");
            return Err(AppError::Unauthorized("invalid admin token".to_string()));
        }

        Ok(Self)
    }
}

/// Strip the `Bearer ` scheme (case-insensitive) from an `Authorization`
/// header value.
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}
