//! Scheduler error types

use casebridge_domain::SyncError;
use thiserror::Error;

/// Scheduler-specific errors
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Scheduler is already running
    #[error("scheduler already running")]
    AlreadyRunning,

    /// Scheduler is not running
    #[error("scheduler not running")]
    NotRunning,

    /// Stop did not complete within the grace period
    #[error("scheduler stop timed out after {seconds}s")]
    StopTimeout { seconds: u64 },

    /// Background task join failed
    #[error("scheduler task join failed: {0}")]
    TaskJoinFailed(String),
}

impl From<SchedulerError> for SyncError {
    fn from(err: SchedulerError) -> Self {
        SyncError::Internal(err.to_string())
    }
}

/// Convenience type alias for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;
