//! Google Home Graph client
//!
//! Pushes device changes from this service to the Home Graph API through
//! two flows: a sync request asking the graph to re-fetch the account's
//! device list, and a state report pushing per-device state deltas.
//!
//! The crate is organized around a few small pieces:
//! - [`client::HomeGraphClient`]: the two outbound flows with their
//!   status-specific retry behavior
//! - [`token::CredentialCache`]: process-wide bearer credential with
//!   coalesced refresh
//! - [`signer::RsaAssertionSigner`]: RS256 service-account assertions
//! - [`ports`]: the traits a host application implements or injects
//! - [`config`]: environment-based configuration loading

pub mod client;
pub mod config;
pub mod ports;
pub mod retry;
pub mod signer;
pub mod token;

mod http;

pub use client::HomeGraphClient;
pub use ports::{AssertionSigner, UserLinkRepository};
pub use signer::{AssertionClaims, RsaAssertionSigner};
pub use token::{Credential, CredentialCache};
