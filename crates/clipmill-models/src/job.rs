//! Transcode job definitions and lifecycle state.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::{JobId, VideoId};
use crate::rendition::{ProducedOutput, RenditionSpec};

/// Job lifecycle status.
///
/// The only legal transitions are `Queued -> Running`,
/// `Queued -> Failed` (the submission never reached a worker) and
/// `Running -> {Done, Failed}`. `Done` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Job is waiting for a worker slot
    #[default]
    Queued,
    /// A worker has claimed the job
    Running,
    /// All renditions transcoded and uploaded
    Done,
    /// Execution failed; see `Job::error`
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed)
    }

    /// Whether `to` is a legal next status.
    pub fn can_transition_to(&self, to: JobStatus) -> bool {
        matches!(
            (self, to),
            (JobStatus::Queued, JobStatus::Running)
                | (JobStatus::Queued, JobStatus::Failed)
                | (JobStatus::Running, JobStatus::Done)
                | (JobStatus::Running, JobStatus::Failed)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One transcode request against exactly one video.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Job {
    /// Unique job ID
    pub id: JobId,

    /// Owner principal (username)
    pub owner: String,

    /// Referenced video; the job does not own the video record
    pub video_id: VideoId,

    /// Lifecycle status
    #[serde(default)]
    pub status: JobStatus,

    /// Requested renditions, fixed at creation
    pub rendition_specs: Vec<RenditionSpec>,

    /// Produced outputs; empty until the job reaches `Done`
    #[serde(default)]
    pub outputs: Vec<ProducedOutput>,

    /// Failure reason; present only when `Failed`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Set when a worker claims the job
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    /// Set when the job reaches a terminal status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Create a new queued job.
    pub fn new(
        owner: impl Into<String>,
        video_id: VideoId,
        rendition_specs: Vec<RenditionSpec>,
    ) -> Self {
        Self {
            id: JobId::new(),
            owner: owner.into(),
            video_id,
            status: JobStatus::Queued,
            rendition_specs,
            outputs: Vec::new(),
            error: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

}
