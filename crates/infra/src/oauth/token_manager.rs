//! Token manager with margin-based refresh and single-flight rotation
//!
//! Guarantees callers a bearer token valid for at least the configured
//! safety margin. The active credential is a guarded shared resource: the
//! in-memory cache sits behind an `RwLock`, and refresh exchanges are
//! serialized behind a `Mutex` so concurrent entity-type runs never trigger
//! overlapping refreshes. A caller that blocks on an in-flight refresh
//! re-checks the cache after acquiring the lock and reuses the fresh token.

use std::sync::Arc;

use async_trait::async_trait;
use casebridge_domain::{OAuthCredential, Result, SyncError};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::traits::{AccessTokenProvider, CredentialStore, TokenEndpoint};

pub struct TokenManager<E: TokenEndpoint + 'static, S: CredentialStore + 'static> {
    endpoint: Arc<E>,
    store: Arc<S>,
    provider: String,
    safety_margin_seconds: i64,
    current: Arc<RwLock<Option<OAuthCredential>>>,
    refresh_lock: Arc<Mutex<()>>,
}

impl<E: TokenEndpoint + 'static, S: CredentialStore + 'static> TokenManager<E, S> {
    #[must_use]
    pub fn new(
        endpoint: E,
        store: Arc<S>,
        provider: impl Into<String>,
        safety_margin_seconds: i64,
    ) -> Self {
        Self {
            endpoint: Arc::new(endpoint),
            store,
            provider: provider.into(),
            safety_margin_seconds,
            current: Arc::new(RwLock::new(None)),
            refresh_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Load the active credential from the store into memory. Returns false
    /// when none exists; that is not an error at startup.
    pub async fn initialize(&self) -> Result<bool> {
        match self.store.active_credential(&self.provider).await? {
            Some(credential) => {
                *self.current.write().await = Some(credential);
                info!(provider = %self.provider, "token manager initialized with stored credential");
                Ok(true)
            }
            None => {
                debug!(provider = %self.provider, "no active credential in store");
                Ok(false)
            }
        }
    }

    /// Persist a credential obtained from the out-of-band bootstrap
    /// authorization and make it current.
    pub async fn install_credential(&self, credential: OAuthCredential) -> Result<()> {
        self.store.save_rotated(&credential).await?;
        *self.current.write().await = Some(credential);
        info!(provider = %self.provider, "credential installed");
        Ok(())
    }

    /// A bearer token valid for at least the safety margin, refreshing
    /// first when needed.
    pub async fn get_valid_token(&self) -> Result<String> {
        if let Some(token) = self.token_within_margin().await {
            return Ok(token);
        }
        self.refresh_current(None).await
    }

    /// Force a rotation after an upstream 401 on `stale_token`.
    pub async fn force_refresh(&self, stale_token: &str) -> Result<String> {
        self.refresh_current(Some(stale_token)).await
    }

    pub async fn is_authenticated(&self) -> bool {
        if self.current.read().await.is_some() {
            return true;
        }
        matches!(self.store.active_credential(&self.provider).await, Ok(Some(_)))
    }

    #[must_use]
    pub fn safety_margin_seconds(&self) -> i64 {
        self.safety_margin_seconds
    }

    async fn token_within_margin(&self) -> Option<String> {
        let current = self.current.read().await;
        current
            .as_ref()
            .filter(|credential| !credential.expires_within(self.safety_margin_seconds))
            .map(|credential| credential.access_token.clone())
    }

    /// Serialized refresh path. Holding `refresh_lock` across the exchange
    /// is what guarantees at most one refresh in flight.
    async fn refresh_current(&self, stale_token: Option<&str>) -> Result<String> {
        let _guard = self.refresh_lock.lock().await;

        let credential = match self.current.read().await.clone() {
            Some(credential) => credential,
            None => self
                .store
                .active_credential(&self.provider)
                .await?
                .ok_or_else(|| {
                    SyncError::AuthenticationRequired(format!(
                        "no active credential for provider '{}'",
                        self.provider
                    ))
                })?,
        };

        // Re-check under the lock: a concurrent caller may have rotated
        // while this one was waiting, and a cold cache may hold a fresh
        // stored credential.
        let fresh = !credential.expires_within(self.safety_margin_seconds);
        let rotated_past_stale =
            stale_token.map_or(true, |stale| credential.access_token != stale);
        if fresh && rotated_past_stale {
            let token = credential.access_token.clone();
            *self.current.write().await = Some(credential);
            return Ok(token);
        }

        match self.endpoint.refresh(&credential.refresh_token).await {
            Ok(rotated) => {
                self.store.save_rotated(&rotated).await?;
                let token = rotated.access_token.clone();
                *self.current.write().await = Some(rotated);
                info!(provider = %self.provider, "access token refreshed");
                Ok(token)
            }
            Err(err @ SyncError::AuthenticationRequired(_)) => {
                // Invalid-grant class: not retried, requires re-authorization.
                warn!(provider = %self.provider, "refresh rejected; deactivating credential");
                if let Err(store_err) = self.store.deactivate(&self.provider).await {
                    warn!(error = %store_err, "failed to deactivate rejected credential");
                }
                *self.current.write().await = None;
                Err(err)
            }
            Err(err) => Err(err),
        }
    }
}

#[async_trait]
impl<E: TokenEndpoint + 'static, S: CredentialStore + 'static> AccessTokenProvider
    for TokenManager<E, S>
{
    async fn access_token(&self) -> Result<String> {
        self.get_valid_token().await
    }

    async fn refresh_after_rejection(&self, stale_token: &str) -> Result<String> {
        self.force_refresh(stale_token).await
    }
}
