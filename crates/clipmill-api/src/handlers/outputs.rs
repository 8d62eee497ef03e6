//! Output artifact streaming.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use clipmill_models::JobId;
use clipmill_storage::content_type_for;
use clipmill_store::StoreError;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// GET /outputs/:job_id/:filename
///
/// Serves an uploaded output through the API. Used when the storage
/// backend cannot presign retrieval URLs. Only files recorded on the job
/// are reachable, so storage keys outside the job's output prefix cannot
/// be addressed.
pub async fn stream_output(
    State(state): State<AppState>,
    user: AuthUser,
    Path((job_id, filename)): Path<(String, String)>,
) -> ApiResult<Response> {
    if filename.contains('/') || filename.contains("..") {
        return Err(ApiError::bad_request("Invalid filename"));
    }

    let id = JobId::from_string(job_id);
    let job = state.store.get_job(&id).await.map_err(|e| match e {
        StoreError::JobNotFound(_) => ApiError::not_found("Job not found"),
        other => other.into(),
    })?;

    if !user.is_admin() && job.owner != user.username {
        return Err(ApiError::forbidden("Not allowed"));
    }

    let key = format!("jobs/{}/outputs/{}", job.id, filename);
    if !job.outputs.iter().any(|o| o.storage_key == key) {
        return Err(ApiError::not_found("Output not found"));
    }

    let bytes = state.storage.get_bytes(&key).await.map_err(|e| {
        if e.is_not_found() {
            ApiError::not_found("Output not found")
        } else {
            e.into()
        }
    })?;

    let response = (
        [
            (header::CONTENT_TYPE, content_type_for(&filename)),
            (header::CONTENT_DISPOSITION, "inline"),
        ],
        bytes,
    )
        .into_response();

    Ok(response)
}
