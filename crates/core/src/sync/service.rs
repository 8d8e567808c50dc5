//! Sync service: the triggering surface the surrounding application consumes
//!
//! Runs are spawned as background tasks, one active run per entity type.
//! Entity types sync concurrently and fail independently; a second trigger
//! for an entity type whose run is still active is rejected.

use std::collections::HashMap;
use std::sync::Arc;

use casebridge_domain::{EntityType, Result, StrategyHint, SyncError};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use uuid::Uuid;

use super::engine::SyncEngine;

struct ActiveRun {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// On-demand trigger surface over the sync engine.
pub struct SyncService {
    engine: Arc<SyncEngine>,
    active: Mutex<HashMap<EntityType, ActiveRun>>,
}

impl SyncService {
    pub fn new(engine: SyncEngine) -> Self {
        Self { engine: Arc::new(engine), active: Mutex::new(HashMap::new()) }
    }

    /// Start a sync run in the background and return its id.
    ///
    /// # Errors
    /// Returns `SyncError::AlreadyRunning` while a run for `entity` is still
    /// active.
    pub async fn trigger_sync(&self, entity: EntityType, hint: StrategyHint) -> Result<Uuid> {
        let mut active = self.active.lock().await;
        if let Some(current) = active.get(&entity) {
            if !current.handle.is_finished() {
                return Err(SyncError::AlreadyRunning(entity.to_string()));
            }
        }

        let run_id = Uuid::now_v7();
        let cancel = CancellationToken::new();
        let engine = Arc::clone(&self.engine);
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            if let Err(err) = engine.run_sync_as(run_id, entity, hint, &token).await {
                error!(%run_id, entity = %entity, error = %err, "sync run failed");
            }
        });

        info!(%run_id, entity = %entity, "sync run triggered");
        active.insert(entity, ActiveRun { cancel, handle });
        Ok(run_id)
    }

    /// Request cooperative cancellation of the active run for `entity`.
    /// Returns false when no run is active.
    pub async fn cancel(&self, entity: EntityType) -> bool {
        let active = self.active.lock().await;
        match active.get(&entity) {
            Some(run) if !run.handle.is_finished() => {
                run.cancel.cancel();
                true
            }
            _ => false,
        }
    }

    /// Whether a run for `entity` is currently active.
    pub async fn is_running(&self, entity: EntityType) -> bool {
        let active = self.active.lock().await;
        active.get(&entity).is_some_and(|run| !run.handle.is_finished())
    }

    /// Cancel all active runs and wait for them to finish.
    pub async fn shutdown(&self) {
        let mut active = self.active.lock().await;
        for run in active.values() {
            run.cancel.cancel();
        }
        for (entity, run) in active.drain() {
            if let Err(err) = run.handle.await {
                if err.is_panic() {
                    error!(entity = %entity, "sync run panicked during shutdown");
                }
            }
        }
    }

    /// Direct access to the engine for callers that want to await a finished
    /// run instead of triggering one in the background.
    #[must_use]
    pub fn engine(&self) -> Arc<SyncEngine> {
        Arc::clone(&self.engine)
    }
}
