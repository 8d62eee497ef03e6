//! Transcode job handlers.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use clipmill_models::{
    default_rendition_ladder, Intensity, Job, JobId, JobStatus, ProducedOutput, RenditionSpec,
    VideoId,
};
use clipmill_store::{JobQuery, JobUpdate, StoreError};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TranscodeRequest {
    pub video_id: String,
    /// Renditions to produce; the default ladder when omitted
    pub renditions: Option<Vec<RenditionSpec>>,
    /// Default intensity for renditions that do not pin their own
    pub intensity: Option<Intensity>,
}

#[derive(Serialize)]
pub struct TranscodeResponse {
    pub job_id: String,
    pub status: JobStatus,
}

/// POST /jobs/transcode
///
/// Validates the rendition specs, checks ownership of the source video,
/// persists a queued job, then hands it to the orchestrator. The response
/// never waits for the transcode itself.
pub async fn create_transcode_job(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<TranscodeRequest>,
) -> ApiResult<Json<TranscodeResponse>> {
    let video_id = VideoId::from_string(payload.video_id);
    let video = state.store.get_video(&video_id).await.map_err(|e| match e {
        StoreError::VideoNotFound(_) => ApiError::not_found("Video not found"),
        other => other.into(),
    })?;

    if !user.is_admin() && video.owner != user.username {
        return Err(ApiError::forbidden("Not allowed to transcode this video"));
    }

    let mut specs = payload.renditions.unwrap_or_else(default_rendition_ladder);
    if specs.is_empty() {
        return Err(ApiError::validation("renditions must not be empty"));
    }
    for spec in &mut specs {
        spec.validate()
            .map_err(|e| ApiError::validation(e.to_string()))?;
        if spec.intensity.is_none() {
            spec.intensity = payload.intensity;
        }
    }

    let job = state
        .store
        .create_job(Job::new(user.username, video_id, specs))
        .await?;

    // A rejected submission must not leave a Queued row behind that no
    // worker will ever claim.
    if let Err(e) = state.orchestrator.submit(job.id.clone()) {
        if let Err(persist_err) = state
            .store
            .update_job(&job.id, JobUpdate::failed(e.to_string()))
            .await
        {
            tracing::error!(
                job_id = %job.id,
                error = %persist_err,
                "Failed to record rejected submission"
            );
        }
        return Err(e.into());
    }

    Ok(Json(TranscodeResponse {
        job_id: job.id.to_string(),
        status: job.status,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ListJobsParams {
    pub status: Option<JobStatus>,
    pub owner: Option<String>,
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
}

#[derive(Serialize)]
pub struct JobSummary {
    pub id: String,
    pub owner: String,
    pub video_id: String,
    pub status: JobStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl From<Job> for JobSummary {
    fn from(job: Job) -> Self {
        Self {
            id: job.id.to_string(),
            owner: job.owner,
            video_id: job.video_id.to_string(),
            status: job.status,
            started_at: job.started_at,
            finished_at: job.finished_at,
        }
    }
}

/// GET /jobs
pub async fn list_jobs(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<ListJobsParams>,
) -> ApiResult<Json<Vec<JobSummary>>> {
    let owner = if user.is_admin() {
        params.owner
    } else {
        Some(user.username)
    };

    let jobs = state
        .store
        .list_jobs(JobQuery {
            owner,
            status: params.status,
            limit: params.limit,
            offset: params.offset,
        })
        .await?;

    Ok(Json(jobs.into_iter().map(JobSummary::from).collect()))
}

#[derive(Serialize)]
pub struct JobDetail {
    pub id: String,
    pub video_id: String,
    pub status: JobStatus,
    pub renditions: Vec<RenditionSpec>,
    pub outputs: Vec<ProducedOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl From<Job> for JobDetail {
    fn from(job: Job) -> Self {
        Self {
            id: job.id.to_string(),
            video_id: job.video_id.to_string(),
            status: job.status,
            renditions: job.rendition_specs,
            outputs: job.outputs,
            error: job.error,
            created_at: job.created_at,
            started_at: job.started_at,
            finished_at: job.finished_at,
        }
    }
}

/// GET /jobs/:job_id
pub async fn get_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobDetail>> {
    let id = JobId::from_string(job_id);
    let job = state.store.get_job(&id).await.map_err(|e| match e {
        StoreError::JobNotFound(_) => ApiError::not_found("Job not found"),
        other => other.into(),
    })?;

    if !user.is_admin() && job.owner != user.username {
        return Err(ApiError::forbidden("Not allowed"));
    }

    Ok(Json(JobDetail::from(job)))
}
