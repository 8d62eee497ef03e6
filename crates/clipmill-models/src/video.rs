//! Uploaded source video metadata.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ids::VideoId;

/// One uploaded source asset.
///
/// Immutable after creation; only the upload flow writes these records.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Video {
    /// Unique video ID
    pub id: VideoId,

    /// Owner principal (username)
    pub owner: String,

    /// Opaque locator understood by the blob storage collaborator
    pub storage_key: String,

    /// Original upload filename
    pub original_name: String,

    /// Size in bytes
    pub size_bytes: u64,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Video {
    /// Create a new video record.
    pub fn new(
        owner: impl Into<String>,
        storage_key: impl Into<String>,
        original_name: impl Into<String>,
        size_bytes: u64,
    ) -> Self {
        Self {
            id: VideoId::new(),
            owner: owner.into(),
            storage_key: storage_key.into(),
            original_name: original_name.into(),
            size_bytes,
            created_at: Utc::now(),
        }
    }
}
