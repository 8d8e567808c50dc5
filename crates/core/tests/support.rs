//! Shared in-memory test doubles for the sync engine suites

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use casebridge_core::{
    normalize_name, AuditLog, CrmDataSource, EntityPage, LocalStore, MatchKey, PageRequest,
    QueryFilter, StoreRecord, UpsertOutcome,
};
use casebridge_domain::{
    CrmRecord, EntityType, Result, SyncDetail, SyncError, SyncRun, SyncRunStatus,
};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

// ============================================================================
// Local store double
// ============================================================================

/// In-memory `LocalStore` with per-external-id failure injection.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, Vec<StoreRecord>>>,
    failing_external_ids: Mutex<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self, table: &str) -> Vec<StoreRecord> {
        self.tables.lock().unwrap().get(table).cloned().unwrap_or_default()
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.rows(table).len()
    }

    pub fn seed(&self, table: &str, row: StoreRecord) {
        self.tables.lock().unwrap().entry(table.to_string()).or_default().push(row);
    }

    /// Make every upsert for this external id fail with a conflict.
    pub fn fail_upserts_for(&self, external_id: &str) {
        self.failing_external_ids.lock().unwrap().insert(external_id.to_string());
    }

    pub fn find_by_external_id(&self, table: &str, external_id: &str) -> Option<StoreRecord> {
        self.rows(table)
            .into_iter()
            .find(|row| row.get("external_id") == Some(&json!(external_id)))
    }
}

#[async_trait]
impl LocalStore for MemoryStore {
    async fn upsert(
        &self,
        table: &str,
        key: &MatchKey,
        record: &StoreRecord,
    ) -> Result<UpsertOutcome> {
        if let Some(Value::String(external_id)) = record.get("external_id") {
            if self.failing_external_ids.lock().unwrap().contains(external_id) {
                return Err(SyncError::UpsertConflict(format!(
                    "constraint violation for {external_id}"
                )));
            }
        }

        let mut tables = self.tables.lock().unwrap();
        let rows = tables.entry(table.to_string()).or_default();
        match rows.iter_mut().find(|row| row.get(&key.column) == Some(&key.value)) {
            Some(row) => {
                for (column, value) in record {
                    row.insert(column.clone(), value.clone());
                }
                Ok(UpsertOutcome::Updated)
            }
            None => {
                let mut row = record.clone();
                row.entry("id".to_string())
                    .or_insert_with(|| json!(Uuid::now_v7().to_string()));
                rows.push(row);
                Ok(UpsertOutcome::Created)
            }
        }
    }

    async fn query(&self, table: &str, filter: &QueryFilter) -> Result<Vec<StoreRecord>> {
        let tables = self.tables.lock().unwrap();
        let Some(rows) = tables.get(table) else {
            return Ok(Vec::new());
        };
        Ok(rows.iter().filter(|row| matches_filter(row, filter)).cloned().collect())
    }
}

fn matches_filter(row: &StoreRecord, filter: &QueryFilter) -> bool {
    match filter {
        QueryFilter::Eq { column, value } => row.get(column) == Some(value),
        QueryFilter::NormalizedEq { column, value } => row
            .get(column)
            .and_then(Value::as_str)
            .is_some_and(|stored| normalize_name(stored) == *value),
    }
}

// ============================================================================
// Audit log double
// ============================================================================

/// In-memory `AuditLog` retaining run snapshots and per-record details.
#[derive(Default)]
pub struct MemoryAuditLog {
    runs: Mutex<Vec<SyncRun>>,
    details: Mutex<Vec<(Uuid, SyncDetail)>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn runs(&self) -> Vec<SyncRun> {
        self.runs.lock().unwrap().clone()
    }

    pub fn run(&self, run_id: Uuid) -> Option<SyncRun> {
        self.runs.lock().unwrap().iter().find(|run| run.id == run_id).cloned()
    }

    pub fn details_for(&self, run_id: Uuid) -> Vec<SyncDetail> {
        self.details
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| *id == run_id)
            .map(|(_, detail)| detail.clone())
            .collect()
    }
}

#[async_trait]
impl AuditLog for MemoryAuditLog {
    async fn record_sync_run(&self, run: &SyncRun) -> Result<()> {
        let mut runs = self.runs.lock().unwrap();
        match runs.iter_mut().find(|existing| existing.id == run.id) {
            Some(existing) => *existing = run.clone(),
            None => runs.push(run.clone()),
        }
        Ok(())
    }

    async fn append_sync_detail(&self, run_id: Uuid, detail: &SyncDetail) -> Result<()> {
        self.details.lock().unwrap().push((run_id, detail.clone()));
        Ok(())
    }

    async fn last_completed_run(&self, entity: EntityType) -> Result<Option<SyncRun>> {
        let runs = self.runs.lock().unwrap();
        Ok(runs
            .iter()
            .rev()
            .find(|run| run.sync_type == entity && run.status == SyncRunStatus::Completed)
            .cloned())
    }
}

// ============================================================================
// CRM double
// ============================================================================

/// Scripted `CrmDataSource` serving pre-built pages and recording requests.
#[derive(Default)]
pub struct ScriptedCrm {
    pages: Mutex<HashMap<EntityType, Vec<std::result::Result<EntityPage, String>>>>,
    requests: Mutex<Vec<(EntityType, PageRequest)>>,
    cancel_on_page: Mutex<Option<(u32, CancellationToken)>>,
    delay: Mutex<Option<Duration>>,
}

impl ScriptedCrm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the page sequence served for `entity`, in page order.
    pub fn script(&self, entity: EntityType, pages: Vec<EntityPage>) {
        self.pages.lock().unwrap().insert(entity, pages.into_iter().map(Ok).collect());
    }

    /// Script pages with an error injected at `failing_page` (1-based).
    pub fn script_with_failure(
        &self,
        entity: EntityType,
        pages: Vec<EntityPage>,
        failing_page: u32,
        message: &str,
    ) {
        let mut scripts: Vec<std::result::Result<EntityPage, String>> =
            pages.into_iter().map(Ok).collect();
        let index = (failing_page - 1) as usize;
        if index < scripts.len() {
            scripts[index] = Err(message.to_string());
        } else {
            scripts.push(Err(message.to_string()));
        }
        self.pages.lock().unwrap().insert(entity, scripts);
    }

    /// Cancel `token` while serving `page`, to exercise the page-boundary
    /// cancellation check.
    pub fn cancel_when_serving(&self, page: u32, token: CancellationToken) {
        *self.cancel_on_page.lock().unwrap() = Some((page, token));
    }

    /// Delay every fetch, to keep runs alive for concurrency tests.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn requests(&self) -> Vec<(EntityType, PageRequest)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_for(&self, entity: EntityType) -> Vec<PageRequest> {
        self.requests()
            .into_iter()
            .filter(|(e, _)| *e == entity)
            .map(|(_, request)| request)
            .collect()
    }
}

#[async_trait]
impl CrmDataSource for ScriptedCrm {
    async fn fetch_page(&self, entity: EntityType, request: PageRequest) -> Result<EntityPage> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.requests.lock().unwrap().push((entity, request));

        if let Some((page, token)) = self.cancel_on_page.lock().unwrap().as_ref() {
            if request.page == *page {
                token.cancel();
            }
        }

        let pages = self.pages.lock().unwrap();
        let Some(scripts) = pages.get(&entity) else {
            return Ok(empty_page());
        };
        match scripts.get((request.page - 1) as usize) {
            Some(Ok(page)) => Ok(page.clone()),
            Some(Err(message)) => {
                Err(SyncError::TransientFetch { message: message.clone(), retries: 5 })
            }
            None => Ok(empty_page()),
        }
    }
}

fn empty_page() -> EntityPage {
    EntityPage { records: Vec::new(), next_page: None, total_count: Some(0) }
}

// ============================================================================
// Record builders
// ============================================================================

pub fn page(page_no: u32, has_more: bool, records: Vec<Value>) -> EntityPage {
    EntityPage {
        total_count: Some(records.len() as u64),
        records: records.into_iter().map(CrmRecord).collect(),
        next_page: has_more.then(|| page_no + 1),
    }
}

pub fn contact(id: u64, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "primary_email_address": format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        "type": "Person",
        "custom_field_values": []
    })
}

pub fn matter(id: u64, display_number: &str) -> Value {
    json!({
        "id": id,
        "display_number": display_number,
        "description": "1031 exchange",
        "status": "Open",
        "custom_field_values": [
            {"custom_field_ref": {"label": "Escrow Number"}, "value_string": format!("ESC-{id}")},
            {"custom_field_ref": {"label": "45 Day Deadline"}, "value_date_time": "2026-02-24T00:00:00Z"},
        ]
    })
}
