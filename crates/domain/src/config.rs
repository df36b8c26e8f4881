//! Configuration for the Home Graph client
//!
//! Credentials have no sensible defaults and must always be provided.
//! Endpoints and retry tunables default to the production values; the
//! retry constants in particular are kept configurable because their
//! origin is API-specific rate-limit guidance rather than anything this
//! crate can verify.

use std::time::Duration;

use url::Url;

use crate::errors::{HomeGraphError, Result};

/// OAuth scope requested for service-account assertions.
pub const HOMEGRAPH_SCOPE: &str = "https://www.googleapis.com/auth/homegraph";

/// Default base URL of the Home Graph API.
pub const DEFAULT_HOMEGRAPH_URL: &str = "https://homegraph.googleapis.com";

/// Default token endpoint for the JWT-bearer grant.
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.google.com/o/oauth2/token";

/// Top-level configuration for the Home Graph client.
#[derive(Debug, Clone)]
pub struct HomeGraphConfig {
    /// Project API key sent on sync requests.
    pub api_key: String,
    /// Service-account issuer (the `iss` claim of signed assertions).
    pub service_account_issuer: String,
    /// Service-account private key, PEM-encoded.
    pub service_account_private_key: String,
    /// Base URL of the Home Graph API.
    pub homegraph_url: String,
    /// Token endpoint URL; also the `aud` claim of signed assertions.
    pub token_url: String,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    /// Retry tunables for the two flows.
    pub retry: RetryTuning,
    /// Token lifetime tunables.
    pub token: TokenTuning,
}

/// Retry tunables for sync requests and state reports.
#[derive(Debug, Clone)]
pub struct RetryTuning {
    /// Lower bound of the randomized backoff after a rate-limited sync
    /// request (inclusive).
    pub sync_backoff_min: Duration,
    /// Upper bound of the randomized backoff after a rate-limited sync
    /// request (exclusive).
    pub sync_backoff_max: Duration,
    /// Fixed delay between report attempts while the account is not yet
    /// provisioned remotely.
    pub report_retry_delay: Duration,
    /// Total time window during which 404 responses to a report are
    /// retried before failing.
    pub report_retry_window: Duration,
}

impl Default for RetryTuning {
    fn default() -> Self {
        Self {
            sync_backoff_min: Duration::from_secs(5),
            sync_backoff_max: Duration::from_secs(25),
            report_retry_delay: Duration::from_secs(20),
            report_retry_window: Duration::from_secs(60),
        }
    }
}

/// Token lifetime tunables.
#[derive(Debug, Clone)]
pub struct TokenTuning {
    /// Safety margin subtracted from the provider-reported token lifetime,
    /// so a cached token is never used right at its expiry.
    pub expiry_margin: Duration,
    /// Validity window claimed on signed assertions (`exp - iat`).
    pub assertion_lifetime: Duration,
}

impl Default for TokenTuning {
    fn default() -> Self {
        Self {
            expiry_margin: Duration::from_secs(5),
            assertion_lifetime: Duration::from_secs(3600),
        }
    }
}

impl HomeGraphConfig {
    /// Build a configuration with default endpoints and tunables.
    pub fn new(
        api_key: impl Into<String>,
        service_account_issuer: impl Into<String>,
        service_account_private_key: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            service_account_issuer: service_account_issuer.into(),
            service_account_private_key: service_account_private_key.into(),
            homegraph_url: DEFAULT_HOMEGRAPH_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            retry: RetryTuning::default(),
            token: TokenTuning::default(),
        }
    }

    /// Validate credential material, endpoints and tunables.
    ///
    /// # Errors
    /// Returns `HomeGraphError::Config` if a credential is empty, an
    /// endpoint does not parse as a URL, or the backoff bounds are
    /// inverted.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(HomeGraphError::Config("api_key must not be empty".into()));
        }
        if self.service_account_issuer.trim().is_empty() {
            return Err(HomeGraphError::Config("service_account_issuer must not be empty".into()));
        }
        if self.service_account_private_key.trim().is_empty() {
            return Err(HomeGraphError::Config(
                "service_account_private_key must not be empty".into(),
            ));
        }

        Url::parse(&self.homegraph_url).map_err(|e| {
            HomeGraphError::Config(format!("invalid homegraph_url '{}': {}", self.homegraph_url, e))
        })?;
        Url::parse(&self.token_url).map_err(|e| {
            HomeGraphError::Config(format!("invalid token_url '{}': {}", self.token_url, e))
        })?;

        if self.retry.sync_backoff_min >= self.retry.sync_backoff_max {
            return Err(HomeGraphError::Config(
                "sync_backoff_min must be strictly below sync_backoff_max".into(),
            ));
        }
        if self.retry.report_retry_window.is_zero() {
            return Err(HomeGraphError::Config("report_retry_window must not be zero".into()));
        }

        Ok(())
    }
}
