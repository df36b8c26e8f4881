//! Service-account assertion claims and the default RS256 signer

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use homegraph_domain::config::HOMEGRAPH_SCOPE;
use homegraph_domain::{HomeGraphError, Result};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::Serialize;

use crate::ports::AssertionSigner;

/// Claim set of a service-account assertion.
///
/// Matches the JWT-bearer grant expected by the token endpoint: issuer,
/// fixed Home Graph scope, the token endpoint as audience, and an
/// `iat`/`exp` pair in unix seconds.
#[derive(Debug, Clone, Serialize)]
pub struct AssertionClaims {
    /// Service-account issuer.
    pub iss: String,
    /// Requested OAuth scope.
    pub scope: String,
    /// Audience, the token endpoint URL.
    pub aud: String,
    /// Issued-at, unix seconds.
    pub iat: i64,
    /// Expiry, unix seconds.
    pub exp: i64,
}

impl AssertionClaims {
    /// Build the claim set for a token request issued now.
    pub fn for_token_request(issuer: &str, audience: &str, lifetime: Duration) -> Self {
        let now = Utc::now().timestamp();
        Self {
            iss: issuer.to_string(),
            scope: HOMEGRAPH_SCOPE.to_string(),
            aud: audience.to_string(),
            iat: now,
            exp: now + lifetime.as_secs() as i64,
        }
    }
}

/// Default [`AssertionSigner`] backed by an RSA private key (RS256).
pub struct RsaAssertionSigner {
    key: EncodingKey,
}

impl RsaAssertionSigner {
    /// Load the signer from a PEM-encoded RSA private key.
    ///
    /// # Errors
    /// Returns `HomeGraphError::Signing` if the PEM does not parse as an
    /// RSA private key.
    pub fn from_pem(pem: &str) -> Result<Self> {
        let key = EncodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| HomeGraphError::Signing(format!("invalid RSA private key: {e}")))?;
        Ok(Self { key })
    }
}

#[async_trait]
impl AssertionSigner for RsaAssertionSigner {
    async fn sign(&self, claims: &AssertionClaims) -> Result<String> {
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), claims, &self.key)
            .map_err(|e| HomeGraphError::Signing(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY_PEM: &str = include_str!("../testdata/rsa_test_key.pem");

    #[test]
    fn claims_cover_requested_lifetime() {
        let claims = AssertionClaims::for_token_request(
            "svc@project.iam.gserviceaccount.com",
            "https://accounts.google.com/o/oauth2/token",
            Duration::from_secs(3600),
        );

        assert_eq!(claims.scope, HOMEGRAPH_SCOPE);
        assert_eq!(claims.aud, "https://accounts.google.com/o/oauth2/token");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn rejects_garbage_pem() {
        let result = RsaAssertionSigner::from_pem("not a key");
        assert!(matches!(result, Err(HomeGraphError::Signing(_))));
    }

    #[tokio::test]
    async fn signs_a_compact_rs256_token() {
        let signer = RsaAssertionSigner::from_pem(TEST_KEY_PEM).expect("test key should parse");
        let claims = AssertionClaims::for_token_request(
            "svc@project.iam.gserviceaccount.com",
            "https://accounts.google.com/o/oauth2/token",
            Duration::from_secs(3600),
        );

        let token = signer.sign(&claims).await.expect("signing should succeed");

        assert_eq!(token.split('.').count(), 3);
        let header = jsonwebtoken::decode_header(&token).expect("header should decode");
        assert_eq!(header.alg, Algorithm::RS256);
    }
}
