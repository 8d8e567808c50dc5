//! OAuth credential model for the CRM connection

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Persisted OAuth credential for an external provider.
///
/// At most one credential per provider is active at a time. Rotation saves
/// the successor as the active credential and deactivates the predecessor;
/// credentials are never hard-deleted.
#[derive(Clone, Serialize, Deserialize)]
pub struct OAuthCredential {
    pub id: Uuid,
    pub provider: String,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl OAuthCredential {
    /// Create an active credential from a token-endpoint response.
    ///
    /// `expires_in` is the token lifetime in seconds, converted to an
    /// absolute expiry at creation time.
    #[must_use]
    pub fn new(
        provider: impl Into<String>,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_in: i64,
        scope: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            provider: provider.into(),
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            token_type: "Bearer".to_string(),
            expires_at: now + Duration::seconds(expires_in),
            scope,
            is_active: true,
            created_at: now,
        }
    }

    /// True when the access token is expired or will expire within
    /// `margin_seconds`.
    #[must_use]
    pub fn expires_within(&self, margin_seconds: i64) -> bool {
        Utc::now() + Duration::seconds(margin_seconds) >= self.expires_at
    }

    /// Seconds until token expiry; negative when already expired.
    #[must_use]
    pub fn seconds_until_expiry(&self) -> i64 {
        (self.expires_at - Utc::now()).num_seconds()
    }
}

// Token material stays out of logs and debug output.
impl fmt::Debug for OAuthCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthCredential")
            .field("id", &self.id)
            .field("provider", &self.provider)
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .field("scope", &self.scope)
            .field("is_active", &self.is_active)
            .finish()
    }
}
