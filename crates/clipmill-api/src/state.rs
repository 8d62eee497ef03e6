//! Application state.

use std::sync::Arc;

use clipmill_media::{check_ffmpeg, FfmpegEncoder};
use clipmill_orchestrator::{Orchestrator, OrchestratorConfig};
use clipmill_storage::{BlobStore, LocalStore, S3Store};
use clipmill_store::{JobStore, MemoryStore};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: Arc<dyn JobStore>,
    pub storage: Arc<dyn BlobStore>,
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    /// Create new application state.
    ///
    /// The storage backend is chosen by `STORAGE_BACKEND`: `s3` uses the
    /// configured bucket, anything else (default `local`) writes under
    /// `STORAGE_ROOT`.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let ffmpeg = check_ffmpeg()?;
        tracing::info!(ffmpeg = %ffmpeg.display(), "Found ffmpeg");

        let storage: Arc<dyn BlobStore> = match std::env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "local".to_string())
            .to_lowercase()
            .as_str()
        {
            "s3" => Arc::new(S3Store::from_env()?),
            _ => {
                let root = std::env::var("STORAGE_ROOT")
                    .unwrap_or_else(|_| "./data/storage".to_string());
                Arc::new(LocalStore::new(root))
            }
        };

        let store: Arc<dyn JobStore> = Arc::new(MemoryStore::new());

        let orchestrator = Orchestrator::start(
            OrchestratorConfig::from_env(),
            Arc::clone(&store),
            Arc::clone(&storage),
            Arc::new(FfmpegEncoder::new()),
        );

        Ok(Self {
            config,
            store,
            storage,
            orchestrator: Arc::new(orchestrator),
        })
    }
}
