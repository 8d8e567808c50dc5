//! Sync run audit model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::entity::EntityType;

/// Strategy resolved for one sync run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum SyncStrategy {
    /// Every record is considered, regardless of modification time.
    Full,
    /// Only records modified since the last completed run are considered.
    Incremental { since: DateTime<Utc> },
}

/// Strategy hint passed by the trigger; resolved per run against the audit
/// history (an incremental hint without a prior completed run falls back to
/// a full sync).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyHint {
    Full,
    Incremental,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncRunStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl SyncRunStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// One recorded failure within a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncRunError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    pub message: String,
}

/// Audit record of one sync invocation.
///
/// Owned exclusively by the engine for the duration of the invocation;
/// recorded to the audit log at start and again on finalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncRun {
    pub id: Uuid,
    pub sync_type: EntityType,
    #[serde(flatten)]
    pub strategy: SyncStrategy,
    pub status: SyncRunStatus,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub records_processed: u64,
    pub records_created: u64,
    pub records_updated: u64,
    pub records_failed: u64,
    pub errors: Vec<SyncRunError>,
}

impl SyncRun {
    /// Start a run in the `Running` state with a fresh id.
    #[must_use]
    pub fn begin(sync_type: EntityType, strategy: SyncStrategy) -> Self {
        Self::begin_with_id(Uuid::now_v7(), sync_type, strategy)
    }

    /// Start a run with an externally allocated id (the trigger surface
    /// hands the id out before the run is spawned).
    #[must_use]
    pub fn begin_with_id(id: Uuid, sync_type: EntityType, strategy: SyncStrategy) -> Self {
        Self {
            id,
            sync_type,
            strategy,
            status: SyncRunStatus::Running,
            started_at: Utc::now(),
            completed_at: None,
            records_processed: 0,
            records_created: 0,
            records_updated: 0,
            records_failed: 0,
            errors: Vec::new(),
        }
    }

    /// Record a record-level failure: counted and logged, run continues.
    pub fn record_failure(&mut self, external_id: Option<String>, message: impl Into<String>) {
        self.records_failed += 1;
        self.errors.push(SyncRunError { external_id, message: message.into() });
    }

    /// Record a run-level error without touching the per-record counters.
    pub fn record_run_error(&mut self, message: impl Into<String>) {
        self.errors.push(SyncRunError { external_id: None, message: message.into() });
    }

    /// Transition to a terminal status, stamping `completed_at`.
    pub fn finalize(&mut self, status: SyncRunStatus) {
        debug_assert!(status.is_terminal());
        self.status = status;
        self.completed_at = Some(Utc::now());
    }
}

/// Outcome of one record within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncAction {
    Created,
    Updated,
    Failed,
}

/// Per-record detail appended to the audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    pub action: SyncAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SyncDetail {
    #[must_use]
    pub fn created(external_id: String) -> Self {
        Self { external_id: Some(external_id), action: SyncAction::Created, message: None }
    }

    #[must_use]
    pub fn updated(external_id: String) -> Self {
        Self { external_id: Some(external_id), action: SyncAction::Updated, message: None }
    }

    #[must_use]
    pub fn failed(external_id: Option<String>, message: impl Into<String>) -> Self {
        Self { external_id, action: SyncAction::Failed, message: Some(message.into()) }
    }
}
