//! Store error types.

use clipmill_models::JobStatus;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur against the job/video store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Video not found: {0}")]
    VideoNotFound(String),

    #[error("Illegal status transition: {from} -> {to}")]
    IllegalTransition { from: JobStatus, to: JobStatus },

    #[error("Store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn job_not_found(id: impl Into<String>) -> Self {
        Self::JobNotFound(id.into())
    }

    pub fn video_not_found(id: impl Into<String>) -> Self {
        Self::VideoNotFound(id.into())
    }
}
