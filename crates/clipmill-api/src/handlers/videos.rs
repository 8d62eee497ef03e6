//! Video upload and listing handlers.

use axum::extract::{Multipart, Query, State};
use axum::Json;
use clipmill_models::Video;
use clipmill_storage::content_type_for;
use clipmill_store::VideoQuery;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::metrics::record_upload_bytes;
use crate::state::AppState;

#[derive(Serialize)]
pub struct UploadResponse {
    pub video_id: String,
    pub storage_key: String,
    pub size_bytes: u64,
    pub original_name: String,
}

/// POST /videos/upload
///
/// Accepts a multipart form with a single `file` field. The upload is
/// stored under `incoming/{uuid}{ext}` and a video record is created for
/// the authenticated user.
pub async fn upload_video(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let original_name = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "upload.mp4".to_string());
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {}", e)))?;
        upload = Some((original_name, bytes.to_vec()));
        break;
    }

    let (original_name, bytes) =
        upload.ok_or_else(|| ApiError::bad_request("Missing 'file' field"))?;

    let suffix = std::path::Path::new(&original_name)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_else(|| ".mp4".to_string());
    let storage_key = format!("incoming/{}{}", Uuid::new_v4().simple(), suffix);
    let size_bytes = bytes.len() as u64;

    state
        .storage
        .put_bytes(bytes, &storage_key, content_type_for(&original_name))
        .await?;
    record_upload_bytes(size_bytes);

    let video = state
        .store
        .create_video(Video::new(
            user.username,
            storage_key.clone(),
            original_name.clone(),
            size_bytes,
        ))
        .await?;

    Ok(Json(UploadResponse {
        video_id: video.id.to_string(),
        storage_key,
        size_bytes,
        original_name,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ListVideosParams {
    pub owner: Option<String>,
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
}

/// GET /videos
///
/// Regular users see only their own videos; admins see everything and may
/// filter by owner.
pub async fn list_videos(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<ListVideosParams>,
) -> ApiResult<Json<Vec<Video>>> {
    let owner = if user.is_admin() {
        params.owner
    } else {
        Some(user.username)
    };

    let videos = state
        .store
        .list_videos(VideoQuery {
            owner,
            limit: params.limit,
            offset: params.offset,
        })
        .await?;

    Ok(Json(videos))
}
