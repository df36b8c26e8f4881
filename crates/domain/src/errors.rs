//! Error types used throughout the Home Graph client

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Home Graph operations.
///
/// Two families matter to callers: authentication failures (assertion
/// signing or token exchange) and remote failures (a non-retryable HTTP
/// status from the graph service). Both carry enough context to be logged
/// and acted on by the surrounding code; no local recovery happens beyond
/// the retry policies documented on the client.
///
/// The enum is `Clone` because token-refresh results are shared between
/// concurrent callers awaiting the same in-flight exchange.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum HomeGraphError {
    /// Signing the service-account assertion failed
    #[error("assertion signing failed: {0}")]
    Signing(String),

    /// The token endpoint answered with a non-success status
    #[error("token exchange failed (HTTP {status}): {body}")]
    TokenExchange { status: u16, body: String },

    /// The graph service answered with a non-retryable status
    #[error("home graph request failed (HTTP {status}): {body}")]
    Remote { status: u16, body: String },

    /// Transport-level failure (connect, timeout, malformed response)
    #[error("network error: {0}")]
    Network(String),

    /// Missing or invalid configuration
    #[error("configuration error: {0}")]
    Config(String),
}

impl HomeGraphError {
    /// Create a token-exchange error from status and response body
    pub fn token_exchange(status: u16, body: impl Into<String>) -> Self {
        Self::TokenExchange { status, body: body.into() }
    }

    /// Create a remote error from status and response body
    pub fn remote(status: u16, body: impl Into<String>) -> Self {
        Self::Remote { status, body: body.into() }
    }

    /// True for authentication failures (signing or token exchange)
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Signing(_) | Self::TokenExchange { .. })
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::TokenExchange { status, .. } | Self::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias for Home Graph operations
pub type Result<T> = std::result::Result<T, HomeGraphError>;
