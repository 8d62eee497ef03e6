//! API routes.

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::auth::{login, me};
use crate::handlers::health::health;
use crate::handlers::jobs::{create_transcode_job, get_job, list_jobs};
use crate::handlers::outputs::stream_output;
use crate::handlers::videos::{list_videos, upload_video};
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, request_id, request_logging, security_headers};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let auth_routes = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/me", get(me));

    let video_routes = Router::new()
        .route("/videos/upload", post(upload_video))
        .route("/videos", get(list_videos));

    let job_routes = Router::new()
        .route("/jobs/transcode", post(create_transcode_job))
        .route("/jobs", get(list_jobs))
        .route("/jobs/:job_id", get(get_job));

    let output_routes = Router::new().route("/outputs/:job_id/:filename", get(stream_output));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health));

    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .merge(auth_routes)
        .merge(video_routes)
        .merge(job_routes)
        .merge(output_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        // Axum's built-in 2 MB extractor limit would otherwise override the
        // configured cap for multipart uploads.
        .layer(DefaultBodyLimit::max(state.config.max_body_size))
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
