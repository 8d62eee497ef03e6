//! FFmpeg CLI wrapper for the clipmill transcode engine.
//!
//! This crate provides:
//! - A builder for FFmpeg invocations
//! - The `Encoder` trait (so orchestration tests can substitute a fake)
//! - A bounded-concurrency engine that fans one input out to many renditions

pub mod command;
pub mod encoder;
pub mod engine;
pub mod error;

pub use command::{check_ffmpeg, FfmpegCommand};
pub use encoder::{EncodeRequest, Encoder, FfmpegEncoder};
pub use engine::{rendition_cap, RenditionResult, TranscodeEngine};
pub use error::{MediaError, MediaResult};
