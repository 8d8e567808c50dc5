//! OAuth token lifecycle for the CRM connection
//!
//! The token manager guarantees callers a bearer token valid for at least
//! the configured safety margin, refreshing through the token-endpoint
//! client and persisting rotations through the credential store. Refreshes
//! are serialized: concurrent callers await the in-flight exchange instead
//! of duplicating it.

mod client;
mod store;
mod token_manager;
mod traits;

pub use client::OAuthTokenClient;
pub use store::InMemoryCredentialStore;
pub use token_manager::TokenManager;
pub use traits::{AccessTokenProvider, CredentialStore, TokenEndpoint};
