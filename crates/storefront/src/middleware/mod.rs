//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//!
//! Admin-only routes additionally take the [`RequireAdmin`] extractor.

pub mod admin_auth;
pub mod request_id;

pub use admin_auth::RequireAdmin;
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
