use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::AppError;
use crate::extract::AppJson;
use crate::middleware::auth::{issue_token, AdminClaims};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    token: String,
    expires_in: u64,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/admin/login", post(login))
}

async fn login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let auth = &state.auth;
    let username_ok = constant_time_eq(req.username.as_bytes(), auth.admin_username.as_bytes());
    let password_ok = constant_time_eq(req.password.as_bytes(), auth.admin_password.as_bytes());
    if !(username_ok & password_ok) {
        warn!("Failed admin login for '{}'", req.username);
        return Err(AppError::Authentication("Invalid credentials".to_string()));
    }

    let claims = AdminClaims::admin(&req.username, auth.jwt_expiration_seconds);
    let token = issue_token(auth, &claims)?;

    info!("Admin '{}' logged in", req.username);
    Ok(Json(AuthResponse {
        token,
        expires_in: auth.jwt_expiration_seconds,
    }))
}

/// Compares without short-circuiting on the first differing byte. Only the
/// length is observable.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"putt-putt", b"putt-putt"));
        assert!(!constant_time_eq(b"putt-putt", b"putt-putT"));
        assert!(!constant_time_eq(b"putt", b"putt-putt"));
        assert!(constant_time_eq(b"", b""));
    }
}
