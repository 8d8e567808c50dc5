//! Configuration structures for the sync engine
//!
//! Plain serde-deserializable structs; the infra crate's loader fills them
//! from environment variables or a config file.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BACKOFF_BASE_MS, DEFAULT_BACKOFF_MAX_MS, DEFAULT_MAX_RETRIES, DEFAULT_PAGE_SIZE,
    DEFAULT_PROVIDER, DEFAULT_RATE_LIMIT_PER_SEC, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_SYNC_INTERVAL_SECS, DEFAULT_TOKEN_SAFETY_MARGIN_SECS,
};
use crate::types::EntityType;

/// CRM REST client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrmConfig {
    /// Base URL of the CRM REST API, without a trailing slash
    pub base_url: String,
    /// Requested page size; clamped to the CRM ceiling on the wire
    pub page_size: u32,
    pub request_timeout_secs: u64,
    /// Retry budget for 429/5xx/transport failures, per page
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
    /// Outbound request budget per second (the CRM limits per account)
    pub rate_limit_per_sec: u64,
}

impl Default for CrmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://crm.example.com/api/v4".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
            backoff_max_ms: DEFAULT_BACKOFF_MAX_MS,
            rate_limit_per_sec: DEFAULT_RATE_LIMIT_PER_SEC,
        }
    }
}

impl CrmConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    #[must_use]
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    #[must_use]
    pub fn backoff_max(&self) -> Duration {
        Duration::from_millis(self.backoff_max_ms)
    }
}

/// OAuth provider configuration for the CRM connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthProviderConfig {
    /// Token endpoint URL (`POST /oauth/token`)
    pub token_url: String,
    pub client_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    /// Provider key the credential store partitions on
    pub provider: String,
    /// Seconds before expiry at which a token is treated as expired
    pub safety_margin_secs: i64,
}

impl Default for OAuthProviderConfig {
    fn default() -> Self {
        Self {
            token_url: "https://crm.example.com/oauth/token".to_string(),
            client_id: String::new(),
            client_secret: None,
            provider: DEFAULT_PROVIDER.to_string(),
            safety_margin_secs: DEFAULT_TOKEN_SAFETY_MARGIN_SECS,
        }
    }
}

/// Scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub enabled: bool,
    pub interval_secs: u64,
    /// Entity types synced on each tick
    pub entities: Vec<EntityType>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: DEFAULT_SYNC_INTERVAL_SECS,
            entities: EntityType::ALL.to_vec(),
        }
    }
}

impl ScheduleConfig {
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub crm: CrmConfig,
    pub oauth: OAuthProviderConfig,
    pub schedule: ScheduleConfig,
}
