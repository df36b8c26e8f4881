//! End-to-end coverage for the state-report flow.
//!
//! These tests run the full path through a real RS256 assertion signer,
//! the token exchange, the credential cache, and the report endpoint,
//! with both HTTP endpoints served by wiremock.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use homegraph_client::{
    AssertionSigner, CredentialCache, HomeGraphClient, RsaAssertionSigner, UserLinkRepository,
};
use homegraph_domain::{HomeGraphConfig, StateChanges};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEST_KEY_PEM: &str = include_str!("../testdata/rsa_test_key.pem");

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_env_filter("homegraph_client=debug").try_init();
}

struct StaticLinks {
    linked: bool,
}

#[async_trait]
impl UserLinkRepository for StaticLinks {
    async fn is_user_linked(&self, _agent_user_id: &str) -> homegraph_domain::Result<bool> {
        Ok(self.linked)
    }
}

fn test_config(server_uri: &str) -> Arc<HomeGraphConfig> {
    let mut config = HomeGraphConfig::new("test-key", "svc@project.test", TEST_KEY_PEM);
    config.homegraph_url = server_uri.to_string();
    config.token_url = format!("{server_uri}/token");
    Arc::new(config)
}

fn build_client(config: Arc<HomeGraphConfig>, linked: bool) -> Result<HomeGraphClient> {
    let signer: Arc<dyn AssertionSigner> =
        Arc::new(RsaAssertionSigner::from_pem(&config.service_account_private_key)?);
    let credentials = Arc::new(CredentialCache::new(Arc::clone(&config), signer)?);
    let client = HomeGraphClient::new(config, Arc::new(StaticLinks { linked }), credentials)?;
    Ok(client)
}

async fn mount_token_endpoint(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer"))
        .and(body_string_contains("assertion="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "integration-token",
            "expires_in": 3600
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn report_flows_through_signed_token_exchange() -> Result<()> {
    init_tracing();
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/v1/devices:reportStateAndNotification"))
        .and(header("authorization", "Bearer integration-token"))
        .and(header("X-GFE-SSL", "yes"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = build_client(test_config(&server.uri()), true)?;

    let mut changes = StateChanges::new();
    changes.insert("thermostat-1", json!({ "thermostatTemperatureSetpoint": 21.5 }));
    client.report_state("user-1", changes, Some("req-42")).await?;
    Ok(())
}

#[tokio::test]
async fn concurrent_reports_share_one_token_exchange() -> Result<()> {
    init_tracing();
    let server = MockServer::start().await;
    // Delay the exchange so both reports arrive while it is in flight.
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access_token": "integration-token", "expires_in": 3600 }))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/devices:reportStateAndNotification"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let client = Arc::new(build_client(test_config(&server.uri()), true)?);

    let mut changes = StateChanges::new();
    changes.insert("light-1", json!({ "on": true }));

    let (first, second) = tokio::join!(
        client.report_state("user-1", changes.clone(), None),
        client.report_state("user-1", StateChanges::new(), None),
    );
    first?;
    second?;
    Ok(())
}

#[tokio::test]
async fn unlinked_account_sends_no_traffic() -> Result<()> {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;

    let client = build_client(test_config(&server.uri()), false)?;

    let mut changes = StateChanges::new();
    changes.insert("light-1", json!({ "on": false }));
    client.report_state("user-1", changes, None).await?;
    client.request_sync("user-1").await?;
    Ok(())
}
