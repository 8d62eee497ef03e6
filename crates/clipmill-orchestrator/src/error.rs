//! Orchestrator error types.

use thiserror::Error;

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Job backlog is full")]
    BacklogFull,

    #[error("Orchestrator is shut down")]
    Closed,

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Source video not found: {0}")]
    VideoNotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] clipmill_storage::StorageError),

    #[error("Store error: {0}")]
    Store(#[from] clipmill_store::StoreError),

    #[error("Media error: {0}")]
    Media(#[from] clipmill_media::MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OrchestratorError {
    pub fn job_not_found(id: impl Into<String>) -> Self {
        Self::JobNotFound(id.into())
    }

    pub fn video_not_found(id: impl Into<String>) -> Self {
        Self::VideoNotFound(id.into())
    }
}
