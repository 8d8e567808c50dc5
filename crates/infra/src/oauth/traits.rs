//! Trait seams for the OAuth stack
//!
//! Each trait has one production implementation and mock implementations in
//! tests, so token behavior is testable without a live OAuth server.

use async_trait::async_trait;
use casebridge_domain::{OAuthCredential, Result};

/// Provides bearer tokens to outbound CRM calls.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// A token guaranteed valid for at least the configured safety margin.
    async fn access_token(&self) -> Result<String>;

    /// Force a rotation after the CRM rejected `stale_token` with a 401.
    /// Implementations skip the exchange when the current token already
    /// differs from the stale one (another caller rotated first).
    async fn refresh_after_rejection(&self, stale_token: &str) -> Result<String>;
}

/// Grant exchanges against the provider's token endpoint.
#[async_trait]
pub trait TokenEndpoint: Send + Sync {
    /// `grant_type=refresh_token` exchange.
    ///
    /// # Errors
    /// `SyncError::AuthenticationRequired` for invalid-grant-class
    /// rejections (the credential is unusable and must be deactivated);
    /// other variants for transport or server failures, which leave the
    /// credential intact.
    async fn refresh(&self, refresh_token: &str) -> Result<OAuthCredential>;

    /// `grant_type=authorization_code` exchange, used by the out-of-band
    /// bootstrap flow.
    async fn exchange_code(&self, code: &str) -> Result<OAuthCredential>;
}

/// Persistence for OAuth credentials.
///
/// Implementations enforce the single-active-credential-per-provider
/// invariant: saving a rotated credential deactivates its predecessors, and
/// credentials are deactivated rather than deleted.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn active_credential(&self, provider: &str) -> Result<Option<OAuthCredential>>;

    /// Persist `credential` as the single active credential for its
    /// provider.
    async fn save_rotated(&self, credential: &OAuthCredential) -> Result<()>;

    /// Deactivate every credential for `provider`.
    async fn deactivate(&self, provider: &str) -> Result<()>;
}
