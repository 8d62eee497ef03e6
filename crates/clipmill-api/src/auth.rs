//! JWT authentication with a fixed demo user table.
//!
//! Tokens are HS256-signed with the configured secret. The user table is
//! hard-coded; there is no registration flow.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

/// Demo users.
const USERS: &[(&str, &str, &str)] = &[
    ("admin", "admin123", "admin"),
    ("kimia", "kimia123", "user"),
    ("sara", "sara123", "user"),
];

/// Look up a demo user by credentials. Returns the role on success.
pub fn verify_credentials(username: &str, password: &str) -> Option<&'static str> {
    USERS
        .iter()
        .find(|(name, pass, _)| *name == username && *pass == password)
        .map(|(_, _, role)| *role)
}

/// Token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Username
    pub sub: String,
    /// Role ("admin" or "user")
    pub role: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiration (unix seconds)
    pub exp: i64,
}

/// Create a signed access token for a user.
pub fn create_access_token(
    username: &str,
    role: &str,
    secret: &str,
    ttl: std::time::Duration,
) -> Result<String, ApiError> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: username.to_string(),
        role: role.to_string(),
        iat: now,
        exp: now + ttl.as_secs() as i64,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::internal(format!("Failed to sign token: {}", e)))
}

/// Decode and validate an access token.
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::unauthorized("Invalid or expired token"))
}

/// Authenticated user extracted from the Authorization header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub username: String,
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("Invalid Authorization header format"))?;

        let claims = decode_token(token, &state.config.jwt_secret)?;

        Ok(AuthUser {
            username: claims.sub,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_verify_credentials() {
        assert_eq!(verify_credentials("admin", "admin123"), Some("admin"));
        assert_eq!(verify_credentials("kimia", "kimia123"), Some("user"));
        assert_eq!(verify_credentials("kimia", "wrong"), None);
        assert_eq!(verify_credentials("nobody", "admin123"), None);
    }

    #[test]
    fn test_token_round_trip() {
        let token =
            create_access_token("kimia", "user", "test-secret", Duration::from_secs(60)).unwrap();
        let claims = decode_token(&token, "test-secret").unwrap();
        assert_eq!(claims.sub, "kimia");
        assert_eq!(claims.role, "user");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token =
            create_access_token("kimia", "user", "test-secret", Duration::from_secs(60)).unwrap();
        assert!(decode_token(&token, "other-secret").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: "kimia".to_string(),
            role: "user".to_string(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        assert!(decode_token(&token, "test-secret").is_err());
    }
}
