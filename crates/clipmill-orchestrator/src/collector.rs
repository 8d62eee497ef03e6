//! Output collection and upload.

use std::path::Path;
use std::time::Duration;

use clipmill_media::RenditionResult;
use clipmill_models::{JobId, ProducedOutput};
use clipmill_storage::{content_type_for, BlobStore};
use tracing::{debug, warn};

use crate::error::OrchestratorResult;

/// Upload every file produced for a job and describe the results.
///
/// Scans `dir` non-recursively, regular files only, in lexicographic
/// filename order. Each file is uploaded under
/// `jobs/{job_id}/outputs/{filename}` and presigned when the backend
/// supports it; a backend that cannot presign yields `retrieval_url: None`,
/// which is not an error.
pub async fn collect_outputs(
    storage: &dyn BlobStore,
    job_id: &JobId,
    dir: &Path,
    results: &[RenditionResult],
    presign_ttl: Duration,
) -> OrchestratorResult<Vec<ProducedOutput>> {
    let mut files: Vec<(String, std::path::PathBuf)> = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        files.push((name, entry.path()));
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));

    let mut outputs = Vec::with_capacity(files.len());
    for (filename, path) in files {
        let key = format!("jobs/{}/outputs/{}", job_id, filename);
        let content_type = content_type_for(&filename);
        let size_bytes = tokio::fs::metadata(&path).await?.len();

        storage.put_file(&path, &key, content_type).await?;
        debug!(job_id = %job_id, key = %key, size_bytes, "uploaded job output");

        let retrieval_url = storage.presign_retrieval(&key, presign_ttl).await?;

        let matched = results
            .iter()
            .find(|r| r.output_path.file_name().map(|n| n.to_string_lossy().to_string()) == Some(filename.clone()));
        if matched.is_none() {
            warn!(job_id = %job_id, filename = %filename, "output file has no rendition record");
        }

        outputs.push(ProducedOutput {
            label: matched
                .map(|r| r.label.clone())
                .unwrap_or_else(|| filename.clone()),
            storage_key: key,
            size_bytes,
            retrieval_url,
            encode_seconds: matched.map(|r| r.encode_seconds).unwrap_or(0.0),
        });
    }

    Ok(outputs)
}
