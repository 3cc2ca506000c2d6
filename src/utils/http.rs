//! Shared HTTP client settings.

use std::time::Duration;

use anyhow::{Context, Result};

use crate::constants::{DEFAULT_HTTP_TIMEOUT, HTTP_TIMEOUT_ENV, user_agent};

/// Build the client used for every outgoing request.
///
/// Requests carry the edgectl `User-Agent` and time out after
/// [`http_timeout`].
pub fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(user_agent())
        .timeout(http_timeout())
        .build()
        .context("Failed to build HTTP client")
}

/// Request timeout: `EDGECTL_HTTP_TIMEOUT` seconds, or the 30 second default.
pub fn http_timeout() -> Duration {
    parse_timeout(std::env::var(HTTP_TIMEOUT_ENV).ok().as_deref())
}

fn parse_timeout(value: Option<&str>) -> Duration {
    match value.map(str::trim).map(str::parse::<u64>) {
        Some(Ok(secs)) if secs > 0 => Duration::from_secs(secs),
        Some(_) => {
            tracing::warn!("Ignoring invalid {HTTP_TIMEOUT_ENV}; using the default timeout");
            DEFAULT_HTTP_TIMEOUT
        }
        None => DEFAULT_HTTP_TIMEOUT,
    }
}
