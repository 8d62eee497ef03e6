//! Durable record collaborator for jobs and videos.
//!
//! The orchestrator and API read and write job/video records only through
//! the `JobStore` trait. The in-memory implementation provides the atomic
//! per-call update semantics the orchestrator relies on; swapping in a
//! relational backend is a separate concern.

pub mod error;
pub mod memory;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use store::{JobQuery, JobStore, JobUpdate, VideoQuery};
