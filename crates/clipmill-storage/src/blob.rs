//! The blob storage collaborator interface.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::StorageResult;

/// Narrow interface over the object storage backend.
///
/// The orchestrator and API talk to storage only through this trait; the
/// backing implementation (S3-compatible service, local directory) is wired
/// at process start.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Materialize the object at `key` into a local file.
    ///
    /// Fails with `StorageError::NotFound` when the key does not exist.
    async fn fetch_to_local(&self, key: &str, dest: &Path) -> StorageResult<()>;

    /// Upload a local file.
    async fn put_file(&self, path: &Path, key: &str, content_type: &str) -> StorageResult<()>;

    /// Upload a byte buffer.
    async fn put_bytes(&self, data: Vec<u8>, key: &str, content_type: &str) -> StorageResult<()>;

    /// Read an object fully into memory (used by the stream endpoint).
    async fn get_bytes(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// Request a short-lived retrieval URL.
    ///
    /// `Ok(None)` is a legitimate answer for backends without presigning;
    /// callers must fall back to the stream endpoint, never treat it as an
    /// error.
    async fn presign_retrieval(&self, key: &str, ttl: Duration) -> StorageResult<Option<String>>;
}
