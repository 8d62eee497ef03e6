//! Login and identity handlers.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::{create_access_token, verify_credentials, AuthUser};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub role: String,
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    payload
        .validate()
        .map_err(|e| ApiError::validation(e.to_string()))?;

    let role = verify_credentials(&payload.username, &payload.password)
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    let token = create_access_token(
        &payload.username,
        role,
        &state.config.jwt_secret,
        state.config.token_ttl,
    )?;

    Ok(Json(LoginResponse {
        access_token: token,
        token_type: "bearer".to_string(),
        role: role.to_string(),
    }))
}

#[derive(Serialize)]
pub struct MeResponse {
    pub username: String,
    pub role: String,
}

/// GET /auth/me
pub async fn me(user: AuthUser) -> Json<MeResponse> {
    Json(MeResponse {
        username: user.username,
        role: user.role,
    })
}
