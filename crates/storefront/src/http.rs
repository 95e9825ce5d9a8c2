//! Shared HTTP client construction for external map providers.

use crate::config::MapsConfig;

/// Build a `reqwest` client for geocoding and routing calls.
///
/// The timeout is only set when configured; otherwise the client default
/// applies.
///
/// # Errors
///
/// Returns `reqwest::Error` if the TLS backend cannot be initialized.
pub fn build_client(maps: &MapsConfig) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = reqwest::Client::builder().user_agent(maps.user_agent.clone());
    if let Some(timeout) = maps.timeout {
        builder = builder.timeout(timeout);
    }
    builder.build()
}
