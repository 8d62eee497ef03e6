//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during media processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("encode failed: {stderr}")]
    EncodeFailed {
        stderr: String,
        exit_code: Option<i32>,
    },

    #[error("input file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create an encode failure from the transcoder's diagnostic output.
    pub fn encode_failed(stderr: impl Into<String>, exit_code: Option<i32>) -> Self {
        let stderr = stderr.into();
        let stderr = if stderr.trim().is_empty() {
            "ffmpeg failed".to_string()
        } else {
            stderr.trim().to_string()
        };
        Self::EncodeFailed { stderr, exit_code }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}
