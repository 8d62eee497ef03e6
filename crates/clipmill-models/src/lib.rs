//! Shared data models for the clipmill backend.
//!
//! This crate provides Serde-serializable types for:
//! - Videos (uploaded source assets)
//! - Transcode jobs and their lifecycle status
//! - Rendition specs and encoding intensity tiers
//! - Produced output descriptors

pub mod ids;
pub mod job;
pub mod rendition;
pub mod video;

// Re-export common types
pub use ids::{JobId, VideoId};
pub use job::{Job, JobStatus};
pub use rendition::{
    default_rendition_ladder, Intensity, ProducedOutput, RenditionSpec, SpecError,
};
pub use video::Video;
