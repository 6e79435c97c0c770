//! Shared error types for the services crate.

use thiserror::Error;

use recall_core::model::{CardError, StudySessionError};
use recall_core::scheduler::SchedulerError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `ReviewService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReviewServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `CardService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CardServiceError {
    #[error(transparent)]
    Card(#[from] CardError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `SessionRecorder`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error(transparent)]
    Session(#[from] StudySessionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `StudyPlanService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StudyPlanError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Rejected analyzer or plan policy values.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum PolicyError {
    #[error("ratio `{name}` must be within [0, 1], got {value}")]
    RatioOutOfRange { name: &'static str, value: f64 },
    #[error("weak accuracy {weak} exceeds strong accuracy {strong}")]
    AccuracyOrder { weak: f64, strong: f64 },
    #[error("slow recall threshold must be positive")]
    ZeroSlowRecall,
    #[error("maximum session duration must be positive")]
    ZeroMaxDuration,
}

/// Errors emitted while assembling app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
    #[error(transparent)]
    Policy(#[from] PolicyError),
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
