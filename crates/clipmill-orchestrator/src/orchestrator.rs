//! The job orchestrator.
//!
//! Owns the bounded submission backlog and the job slot semaphore. Each
//! accepted submission is claimed by exactly one worker task which drives
//! the job through its lifecycle and persists every transition.

use std::sync::Arc;

use clipmill_media::{Encoder, TranscodeEngine};
use clipmill_models::{Job, JobId};
use clipmill_storage::BlobStore;
use clipmill_store::{JobStore, JobUpdate, StoreError};
use metrics::{counter, gauge};
use tokio::sync::{mpsc, Semaphore};
use tracing::{info, warn};

use crate::collector::collect_outputs;
use crate::config::{BacklogPolicy, OrchestratorConfig};
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::logging::JobLogger;

/// Shared collaborators for job runs.
struct RunContext {
    config: OrchestratorConfig,
    store: Arc<dyn JobStore>,
    storage: Arc<dyn BlobStore>,
    engine: TranscodeEngine,
}

/// Accepts job submissions and runs them under a concurrency cap.
pub struct Orchestrator {
    tx: mpsc::Sender<JobId>,
    backlog_policy: BacklogPolicy,
}

impl Orchestrator {
    /// Build the orchestrator and spawn its claim loop.
    pub fn start(
        config: OrchestratorConfig,
        store: Arc<dyn JobStore>,
        storage: Arc<dyn BlobStore>,
        encoder: Arc<dyn Encoder>,
    ) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_capacity);
        let backlog_policy = config.backlog_policy;
        let job_slots = Arc::new(Semaphore::new(config.max_concurrent_jobs));

        info!(
            max_concurrent_jobs = config.max_concurrent_jobs,
            queue_capacity = config.queue_capacity,
            "Starting job orchestrator"
        );

        let ctx = Arc::new(RunContext {
            engine: TranscodeEngine::new(encoder),
            config,
            store,
            storage,
        });

        tokio::spawn(Self::claim_loop(ctx, rx, job_slots));

        Self { tx, backlog_policy }
    }

    /// Enqueue a job for execution. Never blocks the caller.
    ///
    /// When the backlog is full the configured [`BacklogPolicy`] decides:
    /// `Wait` hands the send off to a detached task, `Reject` returns
    /// [`OrchestratorError::BacklogFull`].
    pub fn submit(&self, job_id: JobId) -> OrchestratorResult<()> {
        match self.tx.try_send(job_id) {
            Ok(()) => {
                counter!("clipmill_jobs_submitted_total").increment(1);
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(job_id)) => match self.backlog_policy {
                BacklogPolicy::Reject => {
                    counter!("clipmill_jobs_rejected_total").increment(1);
                    Err(OrchestratorError::BacklogFull)
                }
                BacklogPolicy::Wait => {
                    counter!("clipmill_jobs_submitted_total").increment(1);
                    let tx = self.tx.clone();
                    tokio::spawn(async move {
                        if tx.send(job_id).await.is_err() {
                            warn!("Orchestrator closed while a submission was waiting");
                        }
                    });
                    Ok(())
                }
            },
            Err(mpsc::error::TrySendError::Closed(_)) => Err(OrchestratorError::Closed),
        }
    }

    async fn claim_loop(
        ctx: Arc<RunContext>,
        mut rx: mpsc::Receiver<JobId>,
        job_slots: Arc<Semaphore>,
    ) {
        while let Some(job_id) = rx.recv().await {
            let permit = match Arc::clone(&job_slots).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            let ctx = Arc::clone(&ctx);
            tokio::spawn(async move {
                let _permit = permit;
                gauge!("clipmill_jobs_running").increment(1.0);
                run_job(ctx, job_id).await;
                gauge!("clipmill_jobs_running").decrement(1.0);
            });
        }
        info!("Orchestrator claim loop stopped");
    }
}

/// Drive one job from claim to a terminal status.
///
/// Every transition goes through the store. Any failure after the claim
/// marks the job `Failed` with the error text; the scratch directory is
/// removed on every exit path by its `Drop`.
async fn run_job(ctx: Arc<RunContext>, job_id: JobId) {
    let logger = JobLogger::new(&job_id, "transcode");

    let job = match ctx.store.update_job(&job_id, JobUpdate::running()).await {
        Ok(job) => job,
        Err(StoreError::IllegalTransition { from, .. }) => {
            logger.log_warning(&format!("skipping claim, job is already {}", from));
            return;
        }
        Err(e) => {
            logger.log_error(&format!("failed to claim job: {}", e));
            return;
        }
    };

    logger.log_start(&format!("{} renditions requested", job.rendition_specs.len()));

    match execute(&ctx, &job, &logger).await {
        Ok(update) => {
            let n = update.outputs.as_ref().map(Vec::len).unwrap_or(0);
            if let Err(e) = ctx.store.update_job(&job_id, update).await {
                logger.log_error(&format!("failed to record completion: {}", e));
                return;
            }
            counter!("clipmill_jobs_completed_total").increment(1);
            logger.log_completion(&format!("{} outputs uploaded", n));
        }
        Err(e) => {
            counter!("clipmill_jobs_failed_total").increment(1);
            logger.log_error(&e.to_string());
            if let Err(persist_err) = ctx
                .store
                .update_job(&job_id, JobUpdate::failed(e.to_string()))
                .await
            {
                logger.log_error(&format!("failed to record failure: {}", persist_err));
            }
        }
    }
}

/// The part of a job run that can fail.
///
/// The source video is looked up before any scratch space is allocated or
/// any transcoder spawned, so a dangling `video_id` fails the job without
/// side effects.
async fn execute(
    ctx: &RunContext,
    job: &Job,
    logger: &JobLogger,
) -> OrchestratorResult<JobUpdate> {
    let video = ctx
        .store
        .get_video(&job.video_id)
        .await
        .map_err(|e| match e {
            StoreError::VideoNotFound(id) => OrchestratorError::video_not_found(id),
            other => other.into(),
        })?;

    let scratch = tempfile::Builder::new()
        .prefix("clipmill-job-")
        .tempdir()?;

    let extension = std::path::Path::new(&video.original_name)
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_else(|| "mp4".to_string());
    let input = scratch.path().join(format!("input.{}", extension));

    logger.log_progress(&format!("fetching source {}", video.storage_key));
    ctx.storage.fetch_to_local(&video.storage_key, &input).await?;

    let out_dir = scratch.path().join("outputs");
    let results = ctx
        .engine
        .transcode(
            &input,
            &out_dir,
            &job.rendition_specs,
            ctx.config.default_intensity,
        )
        .await?;

    logger.log_progress(&format!("{} renditions encoded, uploading", results.len()));
    let outputs = collect_outputs(
        ctx.storage.as_ref(),
        &job.id,
        &out_dir,
        &results,
        ctx.config.presign_ttl,
    )
    .await?;

    Ok(JobUpdate::done(outputs))
}
