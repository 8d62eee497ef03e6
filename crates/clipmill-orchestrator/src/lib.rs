//! Job orchestration for the transcoding service.
//!
//! Accepts job submissions into a bounded backlog, runs each job under a
//! concurrency cap, and persists every lifecycle transition through the
//! job store. One scratch directory per run, removed on every exit path.

pub mod collector;
pub mod config;
pub mod error;
pub mod logging;
pub mod orchestrator;

pub use collector::collect_outputs;
pub use config::{BacklogPolicy, OrchestratorConfig};
pub use error::{OrchestratorError, OrchestratorResult};
pub use logging::JobLogger;
pub use orchestrator::Orchestrator;
