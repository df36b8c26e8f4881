//! HTTP client construction and transport error mapping

use homegraph_domain::{HomeGraphConfig, HomeGraphError, Result};

/// Build the shared reqwest client with the configured request timeout.
pub(crate) fn build_client(config: &HomeGraphConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()
        .map_err(|e| HomeGraphError::Network(format!("failed to build HTTP client: {e}")))
}

/// Classify a reqwest error into the domain `Network` variant.
pub(crate) fn network_error(err: reqwest::Error) -> HomeGraphError {
    if err.is_timeout() {
        HomeGraphError::Network(format!("request timed out: {err}"))
    } else if err.is_connect() {
        HomeGraphError::Network(format!("connection failed: {err}"))
    } else {
        HomeGraphError::Network(err.to_string())
    }
}
