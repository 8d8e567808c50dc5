//! Sync engine: drives one sync run per entity type
//!
//! One run is a single sequential control flow: strategy selection, a
//! sequential pagination loop, per-record mapping and upsert, and audit
//! bookkeeping. Record-level failures are tolerated and counted; CRM-side
//! failures abort the run. Cancellation is honored at page boundaries only,
//! so a page in flight always completes its upserts.

use std::sync::Arc;

use casebridge_domain::constants::COLUMN_EXTERNAL_ID;
use casebridge_domain::{
    CrmRecord, EntityType, MappedRecord, Result, StrategyHint, SyncDetail, SyncRun, SyncRunStatus,
    SyncStrategy,
};
use chrono::Utc;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::mapping::{tables, FieldMapper, MergePolicy};

use super::ports::{
    AuditLog, CrmDataSource, LocalStore, MatchKey, PageRequest, QueryFilter, StoreRecord,
    UpsertOutcome,
};

/// Lowercased, whitespace-collapsed form used for secondary name matching.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Drives sync runs against the injected CRM source, local store, and audit
/// log.
pub struct SyncEngine {
    crm: Arc<dyn CrmDataSource>,
    store: Arc<dyn LocalStore>,
    audit: Arc<dyn AuditLog>,
    page_size: u32,
}

impl SyncEngine {
    pub fn new(
        crm: Arc<dyn CrmDataSource>,
        store: Arc<dyn LocalStore>,
        audit: Arc<dyn AuditLog>,
        page_size: u32,
    ) -> Self {
        Self { crm, store, audit, page_size }
    }

    /// Run one sync for `entity` with a freshly allocated run id.
    pub async fn run_sync(
        &self,
        entity: EntityType,
        hint: StrategyHint,
        cancel: &CancellationToken,
    ) -> Result<SyncRun> {
        self.run_sync_as(Uuid::now_v7(), entity, hint, cancel).await
    }

    /// Run one sync under an externally allocated run id.
    ///
    /// Run-level errors finalize the run as `Failed`, record it to the audit
    /// log, and propagate to the caller. Cooperative cancellation finalizes
    /// the run as `Cancelled` and returns it normally.
    #[instrument(skip(self, cancel), fields(entity = %entity, run_id = %run_id))]
    pub async fn run_sync_as(
        &self,
        run_id: Uuid,
        entity: EntityType,
        hint: StrategyHint,
        cancel: &CancellationToken,
    ) -> Result<SyncRun> {
        let strategy = self.select_strategy(entity, hint).await;
        let mut run = SyncRun::begin_with_id(run_id, entity, strategy);
        info!(?strategy, "starting sync run");
        self.record_run(&run).await;

        let modified_since = match strategy {
            SyncStrategy::Incremental { since } => Some(since),
            SyncStrategy::Full => None,
        };

        let mut page = 1u32;
        loop {
            // Cancellation is only checked between pages; a page in flight
            // always completes its upserts.
            if cancel.is_cancelled() {
                info!(page, "sync cancelled at page boundary");
                run.finalize(SyncRunStatus::Cancelled);
                self.record_run(&run).await;
                return Ok(run);
            }

            let request = PageRequest { page, per_page: self.page_size, modified_since };
            let fetched = match self.crm.fetch_page(entity, request).await {
                Ok(fetched) => fetched,
                Err(err) => {
                    error!(page, error = %err, "page fetch failed; aborting run");
                    run.record_run_error(err.to_string());
                    run.finalize(SyncRunStatus::Failed);
                    self.record_run(&run).await;
                    return Err(err);
                }
            };

            debug!(page, records = fetched.records.len(), "processing page");
            for record in &fetched.records {
                run.records_processed += 1;
                match self.process_record(entity, record).await {
                    Ok((external_id, UpsertOutcome::Created)) => {
                        run.records_created += 1;
                        self.append_detail(run.id, &SyncDetail::created(external_id)).await;
                    }
                    Ok((external_id, UpsertOutcome::Updated)) => {
                        run.records_updated += 1;
                        self.append_detail(run.id, &SyncDetail::updated(external_id)).await;
                    }
                    Err(err) => {
                        let external_id = record.external_id().ok();
                        warn!(
                            external_id = external_id.as_deref().unwrap_or("<unknown>"),
                            error = %err,
                            "record failed; continuing with rest of page"
                        );
                        run.record_failure(external_id.clone(), err.to_string());
                        self.append_detail(run.id, &SyncDetail::failed(external_id, err.to_string()))
                            .await;
                    }
                }
            }

            match fetched.next_page {
                Some(next) => page = next,
                None => break,
            }
        }

        run.finalize(SyncRunStatus::Completed);
        info!(
            processed = run.records_processed,
            created = run.records_created,
            updated = run.records_updated,
            failed = run.records_failed,
            "sync run completed"
        );
        self.record_run(&run).await;
        Ok(run)
    }

    /// Incremental only when the hint asks for it and a prior completed run
    /// exists; everything else is a full sync.
    async fn select_strategy(&self, entity: EntityType, hint: StrategyHint) -> SyncStrategy {
        if hint == StrategyHint::Incremental {
            match self.audit.last_completed_run(entity).await {
                Ok(Some(previous)) => {
                    if let Some(completed_at) = previous.completed_at {
                        return SyncStrategy::Incremental { since: completed_at };
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(error = %err, "could not read prior runs; falling back to full sync");
                }
            }
        }
        SyncStrategy::Full
    }

    /// Map and upsert one record, reconciling on the external id first and
    /// falling back to a best-effort normalized-name match.
    async fn process_record(
        &self,
        entity: EntityType,
        record: &CrmRecord,
    ) -> Result<(String, UpsertOutcome)> {
        let mapped = FieldMapper::map_entity(entity, record)?;
        let table = entity.table();

        let filter = QueryFilter::Eq {
            column: COLUMN_EXTERNAL_ID.to_string(),
            value: Value::String(mapped.external_id.clone()),
        };
        let existing = self.store.query(table, &filter).await?.into_iter().next();

        let (key, existing_row) = match existing {
            Some(row) => (MatchKey::external_id(&mapped.external_id), Some(row)),
            None => match self.find_by_name(entity, &mapped).await {
                Some(row) => (link_key(&row, &mapped), Some(row)),
                None => (MatchKey::external_id(&mapped.external_id), None),
            },
        };

        let update = MergePolicy::build_update_set(existing_row.as_ref(), &mapped, Utc::now());
        let outcome = self.store.upsert(table, &key, &update).await?;
        Ok((mapped.external_id, outcome))
    }

    /// Best-effort secondary match by normalized name. Lookup failures
    /// degrade to inserting a new row, and only rows without an external id
    /// are eligible for linking.
    async fn find_by_name(&self, entity: EntityType, mapped: &MappedRecord) -> Option<StoreRecord> {
        let column = tables::name_column(entity);
        let name = mapped.columns.get(column)?.as_str()?;
        let filter = QueryFilter::NormalizedEq {
            column: column.to_string(),
            value: normalize_name(name),
        };

        match self.store.query(entity.table(), &filter).await {
            Ok(rows) => rows.into_iter().find(row_is_unlinked),
            Err(err) => {
                warn!(error = %err, "secondary name lookup failed; inserting new record");
                None
            }
        }
    }

    async fn record_run(&self, run: &SyncRun) {
        if let Err(err) = self.audit.record_sync_run(run).await {
            warn!(run_id = %run.id, error = %err, "failed to record sync run");
        }
    }

    async fn append_detail(&self, run_id: Uuid, detail: &SyncDetail) {
        if let Err(err) = self.audit.append_sync_detail(run_id, detail).await {
            warn!(%run_id, error = %err, "failed to append sync detail");
        }
    }
}

/// Upsert key that links a matched local row to the CRM record. Falls back
/// to the external id when the row exposes no local id.
fn link_key(row: &StoreRecord, mapped: &MappedRecord) -> MatchKey {
    row.get(casebridge_domain::constants::COLUMN_LOCAL_ID)
        .cloned()
        .map_or_else(
            || MatchKey::external_id(&mapped.external_id),
            |id| MatchKey::new(casebridge_domain::constants::COLUMN_LOCAL_ID, id),
        )
}

fn row_is_unlinked(row: &StoreRecord) -> bool {
    match row.get(COLUMN_EXTERNAL_ID) {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}
