use thiserror::Error;

use crate::model::{CardError, StudySessionError};
use crate::scheduler::SchedulerError;

/// Umbrella error for callers that do not care which domain rule was broken.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Card(#[from] CardError),
    #[error(transparent)]
    Session(#[from] StudySessionError),
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}
