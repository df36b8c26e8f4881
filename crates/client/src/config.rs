//! Environment-based configuration loader
//!
//! ## Environment Variables
//! - `HOMEGRAPH_API_KEY`: Project API key sent on sync requests
//! - `HOMEGRAPH_SERVICE_ACCOUNT_ISSUER`: Service-account issuer
//! - `HOMEGRAPH_SERVICE_ACCOUNT_PRIVATE_KEY`: PEM-encoded private key
//! - `HOMEGRAPH_SERVICE_ACCOUNT_PRIVATE_KEY_FILE`: Path to a PEM file,
//!   used when the inline key variable is absent
//! - `HOMEGRAPH_URL`: Optional Home Graph base URL override
//! - `HOMEGRAPH_TOKEN_URL`: Optional token endpoint override
//! - `HOMEGRAPH_REQUEST_TIMEOUT_SECS`: Optional per-request timeout

use std::time::Duration;

use homegraph_domain::{HomeGraphConfig, HomeGraphError, Result};

/// Load and validate a configuration from environment variables.
///
/// The private key may be provided inline or as a file path through
/// `HOMEGRAPH_SERVICE_ACCOUNT_PRIVATE_KEY_FILE`; the inline variable
/// wins when both are set.
///
/// # Errors
/// Returns `HomeGraphError::Config` if a required variable is missing,
/// the key file cannot be read, an override fails to parse, or the
/// resulting configuration fails validation.
pub fn load_from_env() -> Result<HomeGraphConfig> {
    let api_key = env_var("HOMEGRAPH_API_KEY")?;
    let issuer = env_var("HOMEGRAPH_SERVICE_ACCOUNT_ISSUER")?;
    let private_key = match std::env::var("HOMEGRAPH_SERVICE_ACCOUNT_PRIVATE_KEY") {
        Ok(pem) => pem,
        Err(_) => {
            let path = env_var("HOMEGRAPH_SERVICE_ACCOUNT_PRIVATE_KEY_FILE").map_err(|_| {
                HomeGraphError::Config(
                    "HOMEGRAPH_SERVICE_ACCOUNT_PRIVATE_KEY or \
                     HOMEGRAPH_SERVICE_ACCOUNT_PRIVATE_KEY_FILE must be set"
                        .into(),
                )
            })?;
            std::fs::read_to_string(&path).map_err(|e| {
                HomeGraphError::Config(format!("cannot read private key file '{path}': {e}"))
            })?
        }
    };

    let mut config = HomeGraphConfig::new(api_key, issuer, private_key);

    if let Ok(url) = std::env::var("HOMEGRAPH_URL") {
        config.homegraph_url = url;
    }
    if let Ok(url) = std::env::var("HOMEGRAPH_TOKEN_URL") {
        config.token_url = url;
    }
    if let Ok(secs) = std::env::var("HOMEGRAPH_REQUEST_TIMEOUT_SECS") {
        let secs = secs.parse::<u64>().map_err(|e| {
            HomeGraphError::Config(format!("invalid HOMEGRAPH_REQUEST_TIMEOUT_SECS: {e}"))
        })?;
        config.request_timeout = Duration::from_secs(secs);
    }

    config.validate()?;
    tracing::info!("home graph configuration loaded from environment");
    Ok(config)
}

fn env_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| HomeGraphError::Config(format!("missing environment variable: {name}")))
}
