//! In-process credential store
//!
//! The hosted deployment persists credentials in the application database;
//! this in-memory implementation backs tests and embedded use. It enforces
//! the same invariants as the durable store: one active credential per
//! provider, deactivation instead of deletion.

use async_trait::async_trait;
use casebridge_domain::{OAuthCredential, Result};
use tokio::sync::RwLock;

use super::traits::CredentialStore;

#[derive(Default)]
pub struct InMemoryCredentialStore {
    credentials: RwLock<Vec<OAuthCredential>>,
}

impl InMemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor seeding one active credential.
    #[must_use]
    pub fn with_credential(credential: OAuthCredential) -> Self {
        Self { credentials: RwLock::new(vec![credential]) }
    }

    /// Total credentials retained, active or not. Rotation history is kept,
    /// never deleted.
    pub async fn credential_count(&self) -> usize {
        self.credentials.read().await.len()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn active_credential(&self, provider: &str) -> Result<Option<OAuthCredential>> {
        let credentials = self.credentials.read().await;
        Ok(credentials
            .iter()
            .rev()
            .find(|credential| credential.provider == provider && credential.is_active)
            .cloned())
    }

    async fn save_rotated(&self, credential: &OAuthCredential) -> Result<()> {
        let mut credentials = self.credentials.write().await;
        for existing in credentials.iter_mut() {
            if existing.provider == credential.provider {
                existing.is_active = false;
            }
        }
        let mut rotated = credential.clone();
        rotated.is_active = true;
        credentials.push(rotated);
        Ok(())
    }

    async fn deactivate(&self, provider: &str) -> Result<()> {
        let mut credentials = self.credentials.write().await;
        for existing in credentials.iter_mut() {
            if existing.provider == provider {
                existing.is_active = false;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rotation_keeps_a_single_active_credential() {
        let store = InMemoryCredentialStore::new();

        let first = OAuthCredential::new("crm", "access-1", "refresh-1", 3600, None);
        let second = OAuthCredential::new("crm", "access-2", "refresh-2", 3600, None);
        store.save_rotated(&first).await.unwrap();
        store.save_rotated(&second).await.unwrap();

        let active = store.active_credential("crm").await.unwrap().unwrap();
        assert_eq!(active.access_token, "access-2");

        // Predecessors are deactivated, not deleted.
        assert_eq!(store.credential_count().await, 2);
    }

    #[tokio::test]
    async fn deactivate_leaves_no_active_credential() {
        let store = InMemoryCredentialStore::with_credential(OAuthCredential::new(
            "crm", "access", "refresh", 3600, None,
        ));

        store.deactivate("crm").await.unwrap();

        assert!(store.active_credential("crm").await.unwrap().is_none());
        assert_eq!(store.credential_count().await, 1);
    }

    #[tokio::test]
    async fn providers_are_partitioned() {
        let store = InMemoryCredentialStore::new();
        store
            .save_rotated(&OAuthCredential::new("crm", "a", "r", 3600, None))
            .await
            .unwrap();
        store
            .save_rotated(&OAuthCredential::new("docs", "b", "r", 3600, None))
            .await
            .unwrap();

        store.deactivate("docs").await.unwrap();

        assert!(store.active_credential("crm").await.unwrap().is_some());
        assert!(store.active_credential("docs").await.unwrap().is_none());
    }
}
