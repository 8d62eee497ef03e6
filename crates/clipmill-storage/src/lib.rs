//! Blob storage collaborator for clipmill.
//!
//! This crate provides:
//! - The `BlobStore` trait the orchestrator and API depend on
//! - An S3-compatible client (supports presigned retrieval URLs)
//! - A local filesystem backend for development (no presigning)
//! - Content-type lookup for produced artifacts

pub mod blob;
pub mod content_type;
pub mod error;
pub mod local;
pub mod s3;

pub use blob::BlobStore;
pub use content_type::content_type_for;
pub use error::{StorageError, StorageResult};
pub use local::LocalStore;
pub use s3::{S3Config, S3Store};
