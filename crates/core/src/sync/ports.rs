//! Port interfaces for sync operations

use async_trait::async_trait;
use casebridge_domain::{CrmRecord, EntityType, Result, SyncDetail, SyncRun};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

/// One page request against the CRM.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageRequest {
    /// 1-based page number.
    pub page: u32,
    /// Requested page size; adapters clamp to the CRM ceiling.
    pub per_page: u32,
    /// Incremental filter: only records modified since this instant.
    pub modified_since: Option<DateTime<Utc>>,
}

/// One page of CRM records plus the cursor for the next page.
#[derive(Debug, Clone)]
pub struct EntityPage {
    pub records: Vec<CrmRecord>,
    pub next_page: Option<u32>,
    pub total_count: Option<u64>,
}

/// Paginated read access to the CRM.
#[async_trait]
pub trait CrmDataSource: Send + Sync {
    /// Fetch one page of records for `entity`.
    async fn fetch_page(&self, entity: EntityType, request: PageRequest) -> Result<EntityPage>;
}

/// Flat record exchanged with the local store.
pub type StoreRecord = Map<String, Value>;

/// Column the store matches an upsert against.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchKey {
    pub column: String,
    pub value: Value,
}

impl MatchKey {
    #[must_use]
    pub fn new(column: impl Into<String>, value: Value) -> Self {
        Self { column: column.into(), value }
    }

    /// Match on the CRM's primary key, the usual reconciliation path.
    #[must_use]
    pub fn external_id(id: &str) -> Self {
        Self::new(casebridge_domain::constants::COLUMN_EXTERNAL_ID, Value::String(id.to_string()))
    }
}

/// Row filter for store queries.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryFilter {
    /// Exact equality on a column.
    Eq { column: String, value: Value },
    /// Case- and whitespace-insensitive equality. `value` arrives already
    /// normalized; implementations normalize the stored side however their
    /// backend supports it.
    NormalizedEq { column: String, value: String },
}

/// Whether an upsert inserted a new row or updated an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// Typed access to the local relational store.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Insert or update the row matching `key` in `table`.
    async fn upsert(
        &self,
        table: &str,
        key: &MatchKey,
        record: &StoreRecord,
    ) -> Result<UpsertOutcome>;

    /// Rows in `table` matching `filter`.
    async fn query(&self, table: &str, filter: &QueryFilter) -> Result<Vec<StoreRecord>>;
}

/// Durable log of sync invocations, consumed by operational tooling.
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Record a run snapshot (at start and again on finalization).
    async fn record_sync_run(&self, run: &SyncRun) -> Result<()>;

    /// Append one per-record detail entry to a run.
    async fn append_sync_detail(&self, run_id: Uuid, detail: &SyncDetail) -> Result<()>;

    /// Most recent run for `entity` that finished `Completed`, if any.
    /// Drives incremental strategy selection.
    async fn last_completed_run(&self, entity: EntityType) -> Result<Option<SyncRun>>;
}
