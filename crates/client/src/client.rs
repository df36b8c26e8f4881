//! Home Graph sync and state-report flows

use std::sync::Arc;
use std::time::Instant;

use homegraph_domain::{HomeGraphConfig, HomeGraphError, Result, StateChanges};
use serde::Serialize;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::http;
use crate::ports::UserLinkRepository;
use crate::retry::{RetryDecision, StatusRetryPolicy};
use crate::token::CredentialCache;

/// Transport hint header sent on report calls.
const GFE_SSL_HEADER: &str = "X-GFE-SSL";

/// Client for the Home Graph device sync and state-report endpoints.
///
/// Both flows first consult the injected [`UserLinkRepository`]; unlinked
/// accounts return `Ok(())` without any HTTP traffic. The credential
/// cache is shared: construct one [`CredentialCache`] per process and
/// hand the same `Arc` to every client.
pub struct HomeGraphClient {
    http: reqwest::Client,
    config: Arc<HomeGraphConfig>,
    links: Arc<dyn UserLinkRepository>,
    credentials: Arc<CredentialCache>,
    sync_retry: StatusRetryPolicy,
    report_retry: StatusRetryPolicy,
}

impl HomeGraphClient {
    /// Create a client over a validated configuration.
    ///
    /// # Errors
    /// Returns `HomeGraphError::Config` for invalid configuration and
    /// `HomeGraphError::Network` if the HTTP client cannot be built.
    pub fn new(
        config: Arc<HomeGraphConfig>,
        links: Arc<dyn UserLinkRepository>,
        credentials: Arc<CredentialCache>,
    ) -> Result<Self> {
        config.validate()?;
        let http = http::build_client(&config)?;
        let sync_retry = StatusRetryPolicy::rate_limited(&config.retry);
        let report_retry = StatusRetryPolicy::not_provisioned(&config.retry);

        Ok(Self { http, config, links, credentials, sync_retry, report_retry })
    }

    /// Ask the graph service to re-fetch the account's device list.
    ///
    /// Rate-limited responses (429) are retried indefinitely with a
    /// randomized backoff; any other non-success status fails
    /// immediately with `HomeGraphError::Remote`.
    ///
    /// # Errors
    /// `Remote { status, body }` on a non-retryable status, `Network` on
    /// transport failures.
    pub async fn request_sync(&self, agent_user_id: &str) -> Result<()> {
        if !self.links.is_user_linked(agent_user_id).await? {
            debug!(agent_user_id, "account not linked, skipping sync request");
            return Ok(());
        }

        let url = format!("{}/v1/devices:requestSync", self.config.homegraph_url);
        let started = Instant::now();

        loop {
            let response = self
                .http
                .post(&url)
                .query(&[("key", self.config.api_key.as_str())])
                .json(&SyncRequest { agent_user_id })
                .send()
                .await
                .map_err(http::network_error)?;

            let status = response.status();
            if status.is_success() {
                debug!(agent_user_id, "sync request accepted");
                return Ok(());
            }

            match self.sync_retry.decide(status, started.elapsed()) {
                RetryDecision::RetryAfter(delay) => {
                    warn!(agent_user_id, delay_ms = delay.as_millis() as u64, "sync request rate limited, backing off");
                    sleep(delay).await;
                }
                RetryDecision::Stop => {
                    let body =
                        response.text().await.unwrap_or_else(|_| "unknown error".to_string());
                    return Err(HomeGraphError::remote(status.as_u16(), body));
                }
            }
        }
    }

    /// Push a batch of device state deltas for the account.
    ///
    /// Each attempt fetches the current cached bearer token (refreshing
    /// through the shared cache when expired). A 404 response is retried
    /// on a fixed delay while the configured window is open, covering
    /// the lag until the account is provisioned remotely; any other
    /// non-success status, or a 404 past the window, fails with
    /// `HomeGraphError::Remote`.
    ///
    /// # Errors
    /// `Remote { status, body }` on a non-retryable status, auth errors
    /// from the credential cache, `Network` on transport failures.
    pub async fn report_state(
        &self,
        agent_user_id: &str,
        state_changes: StateChanges,
        request_id: Option<&str>,
    ) -> Result<()> {
        if !self.links.is_user_linked(agent_user_id).await? {
            debug!(agent_user_id, "account not linked, skipping state report");
            return Ok(());
        }

        let url = format!("{}/v1/devices:reportStateAndNotification", self.config.homegraph_url);
        let body = ReportStateRequest {
            request_id: request_id.map(str::to_string),
            agent_user_id: agent_user_id.to_string(),
            payload: ReportStatePayload { devices: DeviceStates { states: state_changes } },
        };
        let started = Instant::now();

        loop {
            let credential = self.credentials.get_token().await?;

            let response = self
                .http
                .post(&url)
                .bearer_auth(&credential.token)
                .header(GFE_SSL_HEADER, "yes")
                .json(&body)
                .send()
                .await
                .map_err(http::network_error)?;

            let status = response.status();
            if status.is_success() {
                debug!(agent_user_id, devices = body.payload.devices.states.len(), "state report accepted");
                return Ok(());
            }

            match self.report_retry.decide(status, started.elapsed()) {
                RetryDecision::RetryAfter(delay) => {
                    warn!(agent_user_id, delay_ms = delay.as_millis() as u64, "account not yet provisioned remotely, retrying report");
                    sleep(delay).await;
                }
                RetryDecision::Stop => {
                    let text =
                        response.text().await.unwrap_or_else(|_| "unknown error".to_string());
                    return Err(HomeGraphError::remote(status.as_u16(), text));
                }
            }
        }
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SyncRequest<'a> {
    agent_user_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportStateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    request_id: Option<String>,
    agent_user_id: String,
    payload: ReportStatePayload,
}

#[derive(Debug, Serialize)]
struct ReportStatePayload {
    devices: DeviceStates,
}

#[derive(Debug, Serialize)]
struct DeviceStates {
    states: StateChanges,
}
