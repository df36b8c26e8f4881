//! Port interfaces consumed by the Home Graph client
//!
//! These traits define the boundaries between the sync/report flows and
//! the collaborators this crate treats as external: the user-link lookup
//! and the assertion signing primitive.

use async_trait::async_trait;
use homegraph_domain::Result;

use crate::signer::AssertionClaims;

/// Lookup for whether an account has linked its smart-home integration.
///
/// Queried before every outbound flow; never mutated here. Unlinked
/// accounts short-circuit both flows without any HTTP traffic.
#[async_trait]
pub trait UserLinkRepository: Send + Sync {
    /// True when the account has an active link to the remote graph.
    async fn is_user_linked(&self, agent_user_id: &str) -> Result<bool>;
}

/// Signs service-account assertions for the OAuth JWT-bearer grant.
#[async_trait]
pub trait AssertionSigner: Send + Sync {
    /// Produce a compact signed JWT for the given claim set.
    async fn sign(&self, claims: &AssertionClaims) -> Result<String>;
}
