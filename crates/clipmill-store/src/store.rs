//! Persistence trait for jobs and videos.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clipmill_models::{Job, JobId, JobStatus, ProducedOutput, Video, VideoId};

use crate::error::StoreResult;

/// A partial update applied atomically to a stored job.
///
/// Only the fields that are `Some` are written. Status changes are
/// validated against the job lifecycle before being applied.
#[derive(Debug, Default, Clone)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub outputs: Option<Vec<ProducedOutput>>,
    pub error: Option<String>,
}

impl JobUpdate {
    /// Update marking the job as picked up for processing.
    pub fn running() -> Self {
        Self {
            status: Some(JobStatus::Running),
            started_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    /// Update marking the job as successfully finished with its outputs.
    pub fn done(outputs: Vec<ProducedOutput>) -> Self {
        Self {
            status: Some(JobStatus::Done),
            finished_at: Some(Utc::now()),
            outputs: Some(outputs),
            ..Default::default()
        }
    }

    /// Update marking the job as failed with an error description.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Failed),
            finished_at: Some(Utc::now()),
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

/// Filters for listing jobs. Results are newest-first.
#[derive(Debug, Clone, Default)]
pub struct JobQuery {
    pub owner: Option<String>,
    pub status: Option<JobStatus>,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl JobQuery {
    pub const DEFAULT_LIMIT: usize = 20;

    pub fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(Self::DEFAULT_LIMIT)
    }
}

/// Filters for listing videos. Results are newest-first.
#[derive(Debug, Clone, Default)]
pub struct VideoQuery {
    pub owner: Option<String>,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl VideoQuery {
    pub const DEFAULT_LIMIT: usize = 50;

    pub fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(Self::DEFAULT_LIMIT)
    }
}

/// Storage for job and video records.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create_video(&self, video: Video) -> StoreResult<Video>;

    async fn get_video(&self, id: &VideoId) -> StoreResult<Video>;

    async fn list_videos(&self, query: VideoQuery) -> StoreResult<Vec<Video>>;

    async fn create_job(&self, job: Job) -> StoreResult<Job>;

    async fn get_job(&self, id: &JobId) -> StoreResult<Job>;

    async fn list_jobs(&self, query: JobQuery) -> StoreResult<Vec<Job>>;

    /// Apply `update` to the job atomically and return the updated record.
    ///
    /// Fails with [`crate::StoreError::IllegalTransition`] if the update
    /// carries a status the current status cannot move to.
    async fn update_job(&self, id: &JobId, update: JobUpdate) -> StoreResult<Job>;
}
