//! Error types used throughout the sync engine

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for CaseBridge sync operations
#[derive(Error, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum SyncError {
    /// No usable credential; human re-authorization is required before any
    /// further sync can run.
    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    /// A transient CRM failure that survived the retry budget.
    #[error("transient fetch error after {retries} retries: {message}")]
    TransientFetch { message: String, retries: u32 },

    /// Non-retryable request failure (malformed request class).
    #[error("fetch error: {0}")]
    Fetch(String),

    /// A single record could not be projected into local columns.
    #[error("mapping error: {0}")]
    Mapping(String),

    /// A single record could not be upserted.
    #[error("upsert conflict: {0}")]
    UpsertConflict(String),

    /// Local store or audit log failure.
    #[error("store error: {0}")]
    Store(String),

    /// A run for this entity type is still active.
    #[error("a {0} sync is already running")]
    AlreadyRunning(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias for sync operations
pub type Result<T> = std::result::Result<T, SyncError>;
