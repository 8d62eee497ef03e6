//! In-memory store backed by tokio locks.
//!
//! Suitable for a single-process deployment and for tests. Updates hold
//! the write lock for the duration of the read-modify-write so concurrent
//! transitions on the same job cannot interleave.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use clipmill_models::{Job, JobId, Video, VideoId};
use tokio::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::store::{JobQuery, JobStore, JobUpdate, VideoQuery};

#[derive(Default)]
struct MemoryInner {
    videos: HashMap<VideoId, Video>,
    video_order: Vec<VideoId>,
    jobs: HashMap<JobId, Job>,
    job_order: Vec<JobId>,
}

/// In-memory [`JobStore`] implementation.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn create_video(&self, video: Video) -> StoreResult<Video> {
        let mut inner = self.inner.write().await;
        inner.video_order.push(video.id.clone());
        inner.videos.insert(video.id.clone(), video.clone());
        Ok(video)
    }

    async fn get_video(&self, id: &VideoId) -> StoreResult<Video> {
        let inner = self.inner.read().await;
        inner
            .videos
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::video_not_found(id.as_str()))
    }

    async fn list_videos(&self, query: VideoQuery) -> StoreResult<Vec<Video>> {
        let inner = self.inner.read().await;
        let videos = inner
            .video_order
            .iter()
            .rev()
            .filter_map(|id| inner.videos.get(id))
            .filter(|v| query.owner.as_deref().is_none_or(|o| v.owner == o))
            .skip(query.offset)
            .take(query.effective_limit())
            .cloned()
            .collect();
        Ok(videos)
    }

    async fn create_job(&self, job: Job) -> StoreResult<Job> {
        let mut inner = self.inner.write().await;
        inner.job_order.push(job.id.clone());
        inner.jobs.insert(job.id.clone(), job.clone());
        Ok(job)
    }

    async fn get_job(&self, id: &JobId) -> StoreResult<Job> {
        let inner = self.inner.read().await;
        inner
            .jobs
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::job_not_found(id.as_str()))
    }

    async fn list_jobs(&self, query: JobQuery) -> StoreResult<Vec<Job>> {
        let inner = self.inner.read().await;
        let jobs = inner
            .job_order
            .iter()
            .rev()
            .filter_map(|id| inner.jobs.get(id))
            .filter(|j| query.owner.as_deref().is_none_or(|o| j.owner == o))
            .filter(|j| query.status.is_none_or(|s| j.status == s))
            .skip(query.offset)
            .take(query.effective_limit())
            .cloned()
            .collect();
        Ok(jobs)
    }

    async fn update_job(&self, id: &JobId, update: JobUpdate) -> StoreResult<Job> {
        let mut inner = self.inner.write().await;
        let job = inner
            .jobs
            .get_mut(id)
            .ok_or_else(|| StoreError::job_not_found(id.as_str()))?;

        if let Some(status) = update.status {
            if !job.status.can_transition_to(status) {
                return Err(StoreError::IllegalTransition {
                    from: job.status,
                    to: status,
                });
            }
            job.status = status;
        }
        if let Some(started_at) = update.started_at {
            job.started_at = Some(started_at);
        }
        if let Some(finished_at) = update.finished_at {
            job.finished_at = Some(finished_at);
        }
        if let Some(outputs) = update.outputs {
            job.outputs = outputs;
        }
        if let Some(error) = update.error {
            job.error = Some(error);
        }
        Ok(job.clone())
    }
}
