//! Axum HTTP API server.
//!
//! This crate provides:
//! - JWT login with a fixed demo user table
//! - Video upload and listing
//! - Transcode job submission and status
//! - Output streaming for storage backends without presigned URLs
//! - Prometheus metrics and security headers

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
