//! Bounded-concurrency transcode engine.
//!
//! Fans one local input out to many renditions, capping concurrent encoder
//! processes at `min(8, available CPUs)` per call.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use clipmill_models::{Intensity, RenditionSpec};

use crate::encoder::{EncodeRequest, Encoder};
use crate::error::{MediaError, MediaResult};

/// Hard cap on concurrent renditions per job.
pub const MAX_RENDITION_PARALLEL: usize = 8;

/// Per-job rendition concurrency: `min(8, available CPUs)`.
pub fn rendition_cap() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2);
    cpus.min(MAX_RENDITION_PARALLEL)
}

/// Outcome of one rendition encode.
#[derive(Debug, Clone)]
pub struct RenditionResult {
    /// Rendition label
    pub label: String,
    /// Path of the produced file
    pub output_path: PathBuf,
    /// The exact transcoder invocation
    pub command_used: String,
    /// Wall-clock encode duration in seconds
    pub encode_seconds: f64,
}

/// Runs all renditions of a job under a bounded pool.
pub struct TranscodeEngine {
    encoder: Arc<dyn Encoder>,
    max_parallel: usize,
}

impl TranscodeEngine {
    /// Create an engine with the default per-job rendition cap.
    pub fn new(encoder: Arc<dyn Encoder>) -> Self {
        Self {
            encoder,
            max_parallel: rendition_cap(),
        }
    }

    /// Override the rendition cap (still at least 1).
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }

    /// Transcode `input` into one output file per spec under `out_dir`.
    ///
    /// Fail-fast with wait-and-discard: the first rendition failure decides
    /// the result, but in-flight siblings are drained before returning so no
    /// encoder process writes into the scratch directory after the caller
    /// starts cleanup. Outputs of a failed call are never reported.
    pub async fn transcode(
        &self,
        input: &Path,
        out_dir: &Path,
        specs: &[RenditionSpec],
        default_intensity: Intensity,
    ) -> MediaResult<Vec<RenditionResult>> {
        tokio::fs::create_dir_all(out_dir).await?;

        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "input".to_string());

        let semaphore = Arc::new(Semaphore::new(self.max_parallel));
        let mut tasks: JoinSet<MediaResult<(usize, RenditionResult)>> = JoinSet::new();

        for (idx, spec) in specs.iter().enumerate() {
            let req = EncodeRequest {
                input: input.to_path_buf(),
                output: out_dir.join(format!("{}_{}.mp4", stem, spec.label)),
                spec: spec.clone(),
                intensity: spec.intensity.unwrap_or(default_intensity),
            };
            let encoder = Arc::clone(&self.encoder);
            let semaphore = Arc::clone(&semaphore);

            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| MediaError::internal("rendition pool closed"))?;

                let command_used = req.ffmpeg_command().to_display_string();
                debug!(label = %req.spec.label, "starting rendition encode");

                let started = Instant::now();
                encoder.encode(&req).await?;
                let encode_seconds = started.elapsed().as_secs_f64();

                debug!(
                    label = %req.spec.label,
                    encode_seconds,
                    "rendition encode finished"
                );

                Ok((
                    idx,
                    RenditionResult {
                        label: req.spec.label.clone(),
                        output_path: req.output.clone(),
                        command_used,
                        encode_seconds,
                    },
                ))
            });
        }

        let mut slots: Vec<Option<RenditionResult>> = specs.iter().map(|_| None).collect();
        let mut first_err: Option<MediaError> = None;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok((idx, result))) => {
                    slots[idx] = Some(result);
                }
                Ok(Err(e)) => {
                    if first_err.is_none() {
                        first_err = Some(e);
                    } else {
                        warn!("additional rendition failure after first: {}", e);
                    }
                    // Keep draining: siblings must exit before the caller
                    // removes the scratch directory.
                }
                Err(e) => {
                    if first_err.is_none() {
                        first_err = Some(MediaError::internal(format!(
                            "rendition task panicked: {}",
                            e
                        )));
                    }
                }
            }
        }

        if let Some(err) = first_err {
            return Err(err);
        }

        let mut results = Vec::with_capacity(slots.len());
        for slot in slots {
            results.push(slot.ok_or_else(|| MediaError::internal("rendition result missing"))?);
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Encoder that writes a marker file, tracking peak concurrency.
    struct CountingEncoder {
        running: AtomicUsize,
        peak: AtomicUsize,
        fail_label: Option<String>,
    }

    impl CountingEncoder {
        fn new(fail_label: Option<&str>) -> Self {
            Self {
                running: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                fail_label: fail_label.map(|s| s.to_string()),
            }
        }
    }

    #[async_trait]
    impl Encoder for CountingEncoder {
        async fn encode(&self, req: &EncodeRequest) -> MediaResult<()> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            self.running.fetch_sub(1, Ordering::SeqCst);

            if self.fail_label.as_deref() == Some(req.spec.label.as_str()) {
                return Err(MediaError::encode_failed("simulated encoder error", Some(1)));
            }
            tokio::fs::write(&req.output, b"encoded").await?;
            Ok(())
        }
    }

    fn specs(labels: &[&str]) -> Vec<RenditionSpec> {
        labels
            .iter()
            .enumerate()
            .map(|(i, l)| RenditionSpec::new(1280, 720, 20 + i as u8, *l))
            .collect()
    }

    #[tokio::test]
    async fn test_all_renditions_succeed() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("source.mp4");
        tokio::fs::write(&input, b"raw").await.unwrap();
        let out_dir = dir.path().join("out");

        let engine = TranscodeEngine::new(Arc::new(CountingEncoder::new(None)));
        let results = engine
            .transcode(&input, &out_dir, &specs(&["1080p", "720p"]), Intensity::High)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].label, "1080p");
        assert_eq!(results[1].label, "720p");
        for r in &results {
            assert!(r.output_path.exists());
            assert!(r.encode_seconds > 0.0);
            assert!(r.command_used.starts_with("ffmpeg"));
        }
        assert!(out_dir.join("source_1080p.mp4").exists());
    }

    #[tokio::test]
    async fn test_first_failure_fails_the_call() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("source.mp4");
        tokio::fs::write(&input, b"raw").await.unwrap();

        let engine = TranscodeEngine::new(Arc::new(CountingEncoder::new(Some("720p"))));
        let err = engine
            .transcode(
                &input,
                &dir.path().join("out"),
                &specs(&["1080p", "720p", "480p"]),
                Intensity::High,
            )
            .await
            .unwrap_err();

        match err {
            MediaError::EncodeFailed { stderr, .. } => {
                assert!(stderr.contains("simulated encoder error"));
            }
            other => panic!("expected EncodeFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_concurrency_is_capped() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("source.mp4");
        tokio::fs::write(&input, b"raw").await.unwrap();

        let encoder = Arc::new(CountingEncoder::new(None));
        let engine = TranscodeEngine::new(Arc::clone(&encoder) as Arc<dyn Encoder>)
            .with_max_parallel(2);

        engine
            .transcode(
                &input,
                &dir.path().join("out"),
                &specs(&["a", "b", "c", "d", "e", "f"]),
                Intensity::Low,
            )
            .await
            .unwrap();

        assert!(encoder.peak.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn test_rendition_cap_bounds() {
        let cap = rendition_cap();
        assert!(cap >= 1);
        assert!(cap <= MAX_RENDITION_PARALLEL);
    }
}
