//! Sync engine constants
//!
//! Centralized location for the numeric defaults and column names shared
//! across the workspace.

// CRM client configuration
pub const CRM_MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_RETRIES: u32 = 5;
pub const DEFAULT_BACKOFF_BASE_MS: u64 = 500;
pub const DEFAULT_BACKOFF_MAX_MS: u64 = 30_000;
pub const DEFAULT_RATE_LIMIT_PER_SEC: u64 = 10;

// Token manager
pub const DEFAULT_TOKEN_SAFETY_MARGIN_SECS: i64 = 60;
pub const DEFAULT_PROVIDER: &str = "crm";

// Scheduler
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 900;

// Columns written by every sync, regardless of entity type
pub const COLUMN_EXTERNAL_ID: &str = "external_id";
pub const COLUMN_RAW_PAYLOAD: &str = "raw_payload";
pub const COLUMN_LAST_SYNCED_AT: &str = "last_synced_at";
pub const COLUMN_LOCAL_ID: &str = "id";
