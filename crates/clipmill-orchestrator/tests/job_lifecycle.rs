//! End-to-end job lifecycle tests with a fake encoder and local storage.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use clipmill_media::{EncodeRequest, Encoder, MediaError, MediaResult};
use clipmill_models::{
    default_rendition_ladder, Job, JobId, JobStatus, RenditionSpec, Video, VideoId,
};
use clipmill_orchestrator::{BacklogPolicy, Orchestrator, OrchestratorConfig, OrchestratorError};
use clipmill_storage::{BlobStore, LocalStore};
use clipmill_store::{JobStore, JobUpdate, MemoryStore};
use tokio::sync::Notify;

/// Encoder fake that writes a marker file instead of running ffmpeg.
#[derive(Default)]
struct FakeEncoder {
    invocations: AtomicUsize,
    fail_labels: HashSet<String>,
    seen_outputs: Mutex<Vec<PathBuf>>,
    started: Notify,
    hold: Option<Arc<Notify>>,
}

impl FakeEncoder {
    fn new() -> Self {
        Self::default()
    }

    fn failing_on(label: &str) -> Self {
        let mut fail_labels = HashSet::new();
        fail_labels.insert(label.to_string());
        Self {
            fail_labels,
            ..Self::default()
        }
    }

    fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    fn seen_outputs(&self) -> Vec<PathBuf> {
        self.seen_outputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Encoder for FakeEncoder {
    async fn encode(&self, req: &EncodeRequest) -> MediaResult<()> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();
        self.seen_outputs.lock().unwrap().push(req.output.clone());
        if let Some(hold) = &self.hold {
            hold.notified().await;
        }
        if self.fail_labels.contains(&req.spec.label) {
            return Err(MediaError::encode_failed(
                format!("x264 [error]: cannot encode {}", req.spec.label),
                Some(1),
            ));
        }
        tokio::fs::write(&req.output, format!("encoded {}", req.spec.label)).await?;
        Ok(())
    }
}

struct Harness {
    store: Arc<MemoryStore>,
    storage: Arc<LocalStore>,
    encoder: Arc<FakeEncoder>,
    orchestrator: Orchestrator,
    _storage_root: tempfile::TempDir,
}

fn harness_with(encoder: FakeEncoder, config: OrchestratorConfig) -> Harness {
    let storage_root = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryStore::new());
    let storage = Arc::new(LocalStore::new(storage_root.path()));
    let encoder = Arc::new(encoder);
    let orchestrator = Orchestrator::start(
        config,
        Arc::clone(&store) as Arc<dyn JobStore>,
        Arc::clone(&storage) as Arc<dyn BlobStore>,
        Arc::clone(&encoder) as Arc<dyn Encoder>,
    );
    Harness {
        store,
        storage,
        encoder,
        orchestrator,
        _storage_root: storage_root,
    }
}

fn harness(encoder: FakeEncoder) -> Harness {
    harness_with(encoder, OrchestratorConfig::default())
}

async fn seed_video(h: &Harness) -> Video {
    h.storage
        .put_bytes(b"fake mp4 bytes".to_vec(), "incoming/source.mp4", "video/mp4")
        .await
        .unwrap();
    h.store
        .create_video(Video::new(
            "kimia".to_string(),
            "incoming/source.mp4".to_string(),
            "source.mp4".to_string(),
            14,
        ))
        .await
        .unwrap()
}

async fn seed_job(h: &Harness, video_id: VideoId, specs: Vec<RenditionSpec>) -> Job {
    h.store
        .create_job(Job::new("kimia".to_string(), video_id, specs))
        .await
        .unwrap()
}

async fn wait_terminal(h: &Harness, id: &JobId) -> Job {
    for _ in 0..200 {
        let job = h.store.get_job(id).await.unwrap();
        if job.status.is_terminal() {
            return job;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {} did not reach a terminal status", id);
}

#[tokio::test]
async fn full_ladder_completes_with_uploaded_outputs() {
    let h = harness(FakeEncoder::new());
    let video = seed_video(&h).await;
    let job = seed_job(&h, video.id, default_rendition_ladder()).await;

    h.orchestrator.submit(job.id.clone()).unwrap();
    let done = wait_terminal(&h, &job.id).await;

    assert_eq!(done.status, JobStatus::Done);
    assert!(done.started_at.is_some());
    assert!(done.finished_at.is_some());
    assert!(done.error.is_none());
    assert_eq!(done.outputs.len(), 3);

    let keys: HashSet<&str> = done.outputs.iter().map(|o| o.storage_key.as_str()).collect();
    assert_eq!(keys.len(), 3);
    for output in &done.outputs {
        let prefix = format!("jobs/{}/outputs/", job.id);
        assert!(output.storage_key.starts_with(&prefix));
        assert!(output.size_bytes > 0);
        // local backend cannot presign
        assert!(output.retrieval_url.is_none());
        let bytes = h.storage.get_bytes(&output.storage_key).await.unwrap();
        assert_eq!(bytes, format!("encoded {}", output.label).into_bytes());
    }

    let labels: HashSet<&str> = done.outputs.iter().map(|o| o.label.as_str()).collect();
    assert_eq!(labels, HashSet::from(["1080p", "720p", "480p"]));
}

#[tokio::test]
async fn missing_video_fails_without_invoking_the_encoder() {
    let h = harness(FakeEncoder::new());
    let job = seed_job(&h, VideoId::new(), default_rendition_ladder()).await;

    h.orchestrator.submit(job.id.clone()).unwrap();
    let failed = wait_terminal(&h, &job.id).await;

    assert_eq!(failed.status, JobStatus::Failed);
    assert!(failed.finished_at.is_some());
    assert!(failed
        .error
        .as_deref()
        .unwrap()
        .contains("Source video not found"));
    assert!(failed.outputs.is_empty());
    assert_eq!(h.encoder.invocations(), 0);
}

#[tokio::test]
async fn deleted_storage_key_fails_the_job_mentioning_the_key() {
    let h = harness(FakeEncoder::new());
    // video record exists, but its storage key was removed out-of-band
    let video = h
        .store
        .create_video(Video::new(
            "kimia".to_string(),
            "incoming/gone.mp4".to_string(),
            "gone.mp4".to_string(),
            14,
        ))
        .await
        .unwrap();
    let job = seed_job(&h, video.id, default_rendition_ladder()).await;

    h.orchestrator.submit(job.id.clone()).unwrap();
    let failed = wait_terminal(&h, &job.id).await;

    assert_eq!(failed.status, JobStatus::Failed);
    assert!(failed
        .error
        .as_deref()
        .unwrap()
        .contains("incoming/gone.mp4"));
    assert!(failed.outputs.is_empty());
    assert_eq!(h.encoder.invocations(), 0);
}

#[tokio::test]
async fn failing_rendition_fails_the_job_with_encoder_output() {
    let h = harness(FakeEncoder::failing_on("720p"));
    let video = seed_video(&h).await;
    let job = seed_job(&h, video.id, default_rendition_ladder()).await;

    h.orchestrator.submit(job.id.clone()).unwrap();
    let failed = wait_terminal(&h, &job.id).await;

    assert_eq!(failed.status, JobStatus::Failed);
    assert!(failed.outputs.is_empty());
    let error = failed.error.as_deref().unwrap();
    assert!(error.contains("cannot encode 720p"), "error was: {error}");
}

#[tokio::test]
async fn scratch_directory_is_removed_after_success_and_failure() {
    for encoder in [FakeEncoder::new(), FakeEncoder::failing_on("480p")] {
        let h = harness(encoder);
        let video = seed_video(&h).await;
        let job = seed_job(&h, video.id, default_rendition_ladder()).await;

        h.orchestrator.submit(job.id.clone()).unwrap();
        wait_terminal(&h, &job.id).await;

        for output in h.encoder.seen_outputs() {
            let scratch = output.parent().unwrap().parent().unwrap();
            assert!(
                !scratch.exists(),
                "scratch dir {} still exists",
                scratch.display()
            );
        }
    }
}

#[tokio::test]
async fn reject_policy_refuses_submissions_when_backlog_is_full() {
    let hold = Arc::new(Notify::new());
    let encoder = FakeEncoder {
        hold: Some(Arc::clone(&hold)),
        ..FakeEncoder::default()
    };
    let config = OrchestratorConfig {
        max_concurrent_jobs: 1,
        queue_capacity: 1,
        backlog_policy: BacklogPolicy::Reject,
        ..OrchestratorConfig::default()
    };
    let h = harness_with(encoder, config);
    let video = seed_video(&h).await;

    let spec = RenditionSpec {
        width: 640,
        height: 360,
        crf: 28,
        label: "360p".to_string(),
        intensity: None,
    };

    let first = seed_job(&h, video.id.clone(), vec![spec.clone()]).await;
    let second = seed_job(&h, video.id.clone(), vec![spec.clone()]).await;
    let third = seed_job(&h, video.id.clone(), vec![spec]).await;

    h.orchestrator.submit(first.id.clone()).unwrap();
    // the first job must occupy the worker slot before the backlog can fill
    tokio::time::timeout(Duration::from_secs(5), h.encoder.started.notified())
        .await
        .unwrap();

    h.orchestrator.submit(second.id.clone()).unwrap();
    let err = h.orchestrator.submit(third.id.clone()).unwrap_err();
    assert!(matches!(err, OrchestratorError::BacklogFull));

    // the caller records the rejection so the row is not left Queued forever
    let third_row = h
        .store
        .update_job(&third.id, JobUpdate::failed(err.to_string()))
        .await
        .unwrap();
    assert_eq!(third_row.status, JobStatus::Failed);
    assert_eq!(third_row.error.as_deref(), Some("Job backlog is full"));

    hold.notify_waiters();
    hold.notify_one();
    let first_done = wait_terminal(&h, &first.id).await;
    assert_eq!(first_done.status, JobStatus::Done);
    hold.notify_one();
    let second_done = wait_terminal(&h, &second.id).await;
    assert_eq!(second_done.status, JobStatus::Done);
}

#[tokio::test]
async fn jobs_run_queued_before_terminal() {
    let h = harness(FakeEncoder::new());
    let video = seed_video(&h).await;
    let job = seed_job(&h, video.id, default_rendition_ladder()).await;

    let created = h.store.get_job(&job.id).await.unwrap();
    assert_eq!(created.status, JobStatus::Queued);
    assert!(created.started_at.is_none());
    assert!(created.finished_at.is_none());

    h.orchestrator.submit(job.id.clone()).unwrap();
    let done = wait_terminal(&h, &job.id).await;
    assert!(done.started_at.unwrap() <= done.finished_at.unwrap());
}
