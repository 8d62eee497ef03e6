//! Local filesystem storage backend.
//!
//! Simulates object keys under a root directory. Used for development and
//! tests; it cannot presign, so retrieval URLs are `None` and callers stream
//! through the API instead.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::blob::BlobStore;
use crate::error::{StorageError, StorageResult};

/// Blob store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Create a store rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a key to a path inside the root, rejecting escapes.
    fn resolve(&self, key: &str) -> StorageResult<PathBuf> {
        let key = key.trim_start_matches('/');
        if key.is_empty() {
            return Err(StorageError::invalid_key(key));
        }
        // Disallow parent-directory segments; keys are opaque, not paths.
        if key.split('/').any(|seg| seg == ".." || seg.is_empty()) {
            return Err(StorageError::invalid_key(key));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl BlobStore for LocalStore {
    async fn fetch_to_local(&self, key: &str, dest: &Path) -> StorageResult<()> {
        let src = self.resolve(key)?;
        if !src.exists() {
            return Err(StorageError::not_found(key));
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(&src, dest).await?;
        debug!("Copied {} to {}", key, dest.display());
        Ok(())
    }

    async fn put_file(&self, path: &Path, key: &str, _content_type: &str) -> StorageResult<()> {
        let dest = self.resolve(key)?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(path, &dest).await?;
        debug!("Stored {} as {}", path.display(), key);
        Ok(())
    }

    async fn put_bytes(&self, data: Vec<u8>, key: &str, _content_type: &str) -> StorageResult<()> {
        let dest = self.resolve(key)?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&dest, data).await?;
        Ok(())
    }

    async fn get_bytes(&self, key: &str) -> StorageResult<Vec<u8>> {
        let src = self.resolve(key)?;
        if !src.exists() {
            return Err(StorageError::not_found(key));
        }
        Ok(tokio::fs::read(&src).await?)
    }

    async fn presign_retrieval(&self, _key: &str, _ttl: Duration) -> StorageResult<Option<String>> {
        // No presigned URL concept on the local backend; callers stream.
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_put_and_get_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::new(dir.path());

        store
            .put_bytes(b"hello".to_vec(), "incoming/a.mp4", "video/mp4")
            .await
            .unwrap();
        let bytes = store.get_bytes("incoming/a.mp4").await.unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[tokio::test]
    async fn test_fetch_missing_key_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::new(dir.path());

        let err = store
            .fetch_to_local("incoming/missing.mp4", &dir.path().join("out.mp4"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_traversal_keys_rejected() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::new(dir.path());

        for key in ["../etc/passwd", "a/../../b", "a//b", ""] {
            let err = store.get_bytes(key).await.unwrap_err();
            assert!(
                matches!(err, StorageError::InvalidKey(_)),
                "key {:?} should be invalid",
                key
            );
        }
    }

    #[tokio::test]
    async fn test_presign_returns_none() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::new(dir.path());
        let url = store
            .presign_retrieval("incoming/a.mp4", Duration::from_secs(300))
            .await
            .unwrap();
        assert!(url.is_none());
    }
}
