//! Integration tests for Tienda.
//!
//! # Running Tests
//!
//! ```bash
//! # Start PostgreSQL and apply migrations
//! cargo run -p tienda-cli -- migrate
//!
//! # Start the storefront
//! cargo run -p tienda-storefront
//!
//! # Run integration tests
//! cargo test -p tienda-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_BASE_URL` - Running storefront (default `http://localhost:3000`)
//! - `ADMIN_API_TOKEN` - Same token the storefront was started with
//! - `TEST_DATABASE_URL` - Scratch database for repository tests; its
//!   `storefront` schema is dropped and recreated

use reqwest::Client;
use secrecy::SecretString;

/// Base URL for the storefront API.
#[must_use]
pub fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Admin token the storefront under test was configured with.
#[must_use]
pub fn admin_token() -> Option<SecretString> {
    std::env::var("ADMIN_API_TOKEN").ok().map(SecretString::from)
}

/// Scratch database URL for repository tests.
#[must_use]
pub fn test_database_url() -> Option<String> {
    std::env::var("TEST_DATABASE_URL").ok()
}

/// Plain HTTP client for API tests.
///
/// # Errors
///
/// Returns error if the TLS backend cannot be initialized.
pub fn client() -> reqwest::Result<Client> {
    Client::builder().build()
}

/// A checkout id unique to this test run.
#[must_use]
pub fn unique_checkout_id() -> String {
    format!("it_{}", uuid::Uuid::new_v4().simple())
}
