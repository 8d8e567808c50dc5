//! Interval-based sync scheduler
//!
//! Triggers an incremental sync for each configured entity type on a fixed
//! interval. Runs are fired through the sync service, so per-entity
//! single-flight and cross-entity concurrency are preserved: a tick that
//! lands while an entity's previous run is still active simply skips that
//! entity.

use std::sync::Arc;
use std::time::Duration;

use casebridge_core::SyncService;
use casebridge_domain::{EntityType, StrategyHint, SyncError};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::error::{SchedulerError, SchedulerResult};

/// Type alias for the guarded task handle
type TaskHandle = Arc<Mutex<Option<JoinHandle<()>>>>;

/// Configuration for the sync scheduler
#[derive(Debug, Clone)]
pub struct SyncSchedulerConfig {
    /// Interval between ticks
    pub interval: Duration,
    /// Entity types triggered on each tick
    pub entities: Vec<EntityType>,
}

impl Default for SyncSchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(900), // 15 minutes
            entities: EntityType::ALL.to_vec(),
        }
    }
}

/// Interval scheduler over the sync service
pub struct SyncScheduler {
    service: Arc<SyncService>,
    config: SyncSchedulerConfig,
    cancellation_token: CancellationToken,
    task_handle: TaskHandle,
}

impl SyncScheduler {
    pub fn new(service: Arc<SyncService>, config: SyncSchedulerConfig) -> Self {
        Self {
            service,
            config,
            cancellation_token: CancellationToken::new(),
            task_handle: Arc::new(Mutex::new(None)),
        }
    }

    /// Start the scheduler.
    ///
    /// # Errors
    /// Returns `SchedulerError::AlreadyRunning` when already started.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        info!(interval_secs = self.config.interval.as_secs(), "starting sync scheduler");

        // Fresh token so the scheduler can be restarted after a stop.
        self.cancellation_token = CancellationToken::new();

        let service = Arc::clone(&self.service);
        let config = self.config.clone();
        let cancel = self.cancellation_token.clone();

        let handle = tokio::spawn(async move {
            Self::tick_loop(service, config, cancel).await;
        });

        *self.task_handle.lock().await = Some(handle);

        Ok(())
    }

    /// Stop the scheduler gracefully.
    ///
    /// # Errors
    /// Returns `SchedulerError::NotRunning` when not started, or
    /// `StopTimeout` when the background task does not drain in time.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        info!("stopping sync scheduler");
        self.cancellation_token.cancel();

        if let Some(handle) = self.task_handle.lock().await.take() {
            let grace = Duration::from_secs(5);
            match tokio::time::timeout(grace, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => return Err(SchedulerError::TaskJoinFailed(err.to_string())),
                Err(_) => return Err(SchedulerError::StopTimeout { seconds: grace.as_secs() }),
            }
        }

        info!("sync scheduler stopped");
        Ok(())
    }

    /// Whether the background task is alive.
    pub fn is_running(&self) -> bool {
        self.task_handle
            .try_lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|handle| !handle.is_finished()))
            .unwrap_or(false)
    }

    async fn tick_loop(
        service: Arc<SyncService>,
        config: SyncSchedulerConfig,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("scheduler loop cancelled");
                    break;
                }
                _ = tokio::time::sleep(config.interval) => {
                    Self::tick(&service, &config.entities).await;
                }
            }
        }
    }

    async fn tick(service: &Arc<SyncService>, entities: &[EntityType]) {
        for entity in entities {
            match service.trigger_sync(*entity, StrategyHint::Incremental).await {
                Ok(run_id) => {
                    info!(entity = %entity, %run_id, "scheduled sync triggered");
                }
                Err(SyncError::AlreadyRunning(_)) => {
                    debug!(entity = %entity, "previous run still active; skipping tick");
                }
                Err(err) => {
                    error!(entity = %entity, error = %err, "failed to trigger scheduled sync");
                }
            }
        }
    }
}

/// Ensure the background task stops when the scheduler is dropped.
impl Drop for SyncScheduler {
    fn drop(&mut self) {
        if !self.cancellation_token.is_cancelled() {
            warn!("sync scheduler dropped while running; cancelling");
            self.cancellation_token.cancel();
        }
    }
}
