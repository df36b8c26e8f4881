//! Cached bearer credentials with coalesced refresh
//!
//! One [`CredentialCache`] is created per process and shared by every flow
//! that needs a bearer token. Refreshes are lazy: the first caller that
//! finds the cached credential missing or expired starts a token exchange,
//! and every concurrent caller awaits that same in-flight exchange instead
//! of issuing its own. A failed refresh is never cached; the next call
//! starts from scratch.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use homegraph_domain::{HomeGraphConfig, HomeGraphError, Result};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::http;
use crate::ports::AssertionSigner;
use crate::signer::AssertionClaims;

/// Grant type of the OAuth JWT-bearer token exchange.
const GRANT_TYPE_JWT_BEARER: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// A bearer token with its absolute expiry.
///
/// The expiry already includes the configured safety margin, so a
/// credential that is not [`expired`](Self::is_expired) can be used for a
/// full request without running out mid-flight.
#[derive(Debug, Clone)]
pub struct Credential {
    /// Opaque bearer token presented on `authorization` headers.
    pub token: String,
    /// Instant after which the token must not be used.
    pub expires_at: Instant,
}

impl Credential {
    /// True once the (margin-adjusted) expiry has passed.
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

/// Performs the signed-assertion token exchange.
struct TokenExchanger {
    http: reqwest::Client,
    config: Arc<HomeGraphConfig>,
    signer: Arc<dyn AssertionSigner>,
}

impl TokenExchanger {
    async fn exchange(&self) -> Result<Credential> {
        let claims = AssertionClaims::for_token_request(
            &self.config.service_account_issuer,
            &self.config.token_url,
            self.config.token.assertion_lifetime,
        );
        let assertion = self.signer.sign(&claims).await?;

        let issued_at = Instant::now();
        let response = self
            .http
            .post(&self.config.token_url)
            .form(&[("grant_type", GRANT_TYPE_JWT_BEARER), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(http::network_error)?;

        let status = response.status();
        let body = response.text().await.map_err(http::network_error)?;
        if !status.is_success() {
            warn!(status = status.as_u16(), "token exchange rejected");
            return Err(HomeGraphError::token_exchange(status.as_u16(), body));
        }

        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| HomeGraphError::Network(format!("malformed token response: {e}")))?;

        // Subtract the safety margin up front so expiry checks stay a plain
        // instant comparison.
        let lifetime = Duration::from_secs(parsed.expires_in)
            .saturating_sub(self.config.token.expiry_margin);
        debug!(expires_in = parsed.expires_in, "obtained home graph access token");

        Ok(Credential { token: parsed.access_token, expires_at: issued_at + lifetime })
    }
}

type RefreshFuture = Shared<BoxFuture<'static, Result<Credential>>>;

/// Process-wide cache holding a single bearer credential.
///
/// Constructed once and shared (via `Arc`) between every client that
/// reports state; never a hidden global.
pub struct CredentialCache {
    exchanger: Arc<TokenExchanger>,
    inflight: Mutex<Option<RefreshFuture>>,
}

impl CredentialCache {
    /// Create a cache that exchanges assertions signed by `signer` at the
    /// configured token endpoint.
    ///
    /// # Errors
    /// Returns `HomeGraphError::Network` if the HTTP client cannot be
    /// built.
    pub fn new(config: Arc<HomeGraphConfig>, signer: Arc<dyn AssertionSigner>) -> Result<Self> {
        let http = http::build_client(&config)?;
        Ok(Self {
            exchanger: Arc::new(TokenExchanger { http, config, signer }),
            inflight: Mutex::new(None),
        })
    }

    /// Get the current credential, refreshing it if missing or expired.
    ///
    /// Concurrent callers share a single in-flight exchange; exactly one
    /// HTTP request reaches the token endpoint no matter how many flows
    /// ask at once.
    ///
    /// # Errors
    /// Propagates signing failures and non-success token endpoint
    /// responses. A failed refresh clears the cache slot before
    /// returning, so the next call retries from scratch.
    pub async fn get_token(&self) -> Result<Credential> {
        let shared = {
            let mut slot = self.inflight.lock().await;
            let reusable = slot.as_ref().and_then(|fut| match fut.peek() {
                // Refresh still in flight: join it.
                None => Some(fut.clone()),
                // Completed and still fresh: reuse.
                Some(Ok(credential)) if !credential.is_expired() => Some(fut.clone()),
                // Stale or failed: replace below.
                Some(_) => None,
            });

            match reusable {
                Some(fut) => fut,
                None => {
                    debug!("refreshing home graph access token");
                    let exchanger = Arc::clone(&self.exchanger);
                    let fut = async move { exchanger.exchange().await }.boxed().shared();
                    *slot = Some(fut.clone());
                    fut
                }
            }
        };

        let result = shared.clone().await;

        if result.is_err() {
            // Failure is not cached: drop the slot (only if it still holds
            // this refresh) so the next caller starts a fresh exchange.
            let mut slot = self.inflight.lock().await;
            if slot.as_ref().is_some_and(|fut| fut.ptr_eq(&shared)) {
                *slot = None;
            }
        }

        result
    }
}
