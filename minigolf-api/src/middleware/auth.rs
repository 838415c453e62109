use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use minigolf_store::app_config::AuthConfig;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

pub const ADMIN_ROLE: &str = "ADMIN";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AdminClaims {
    pub sub: String,
    pub role: String,
    pub iat: usize,
    pub exp: usize,
}

impl AdminClaims {
    pub fn admin(username: &str, expires_in_seconds: u64) -> Self {
        let now = chrono::Utc::now().timestamp() as usize;
        Self {
            sub: username.to_string(),
            role: ADMIN_ROLE.to_string(),
            iat: now,
            exp: now + expires_in_seconds as usize,
        }
    }
}

pub fn issue_token(auth: &AuthConfig, claims: &AdminClaims) -> Result<String, AppError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(auth.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token encoding failed: {}", e)))
}

pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Authentication("Missing bearer token".to_string()))?;

    let token_data = decode::<AdminClaims>(
        token,
        &DecodingKey::from_secret(state.auth.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Authentication("Invalid or expired token".to_string()))?;

    if token_data.claims.role != ADMIN_ROLE {
        return Err(AppError::Authorization("Admin role required".to_string()));
    }

    req.extensions_mut().insert(token_data.claims);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> AuthConfig {
        AuthConfig {
            jwt_secret: "unit-test-secret".to_string(),
            jwt_expiration_seconds: 60,
            admin_username: "admin".to_string(),
            admin_password: "admin".to_string(),
        }
    }

    #[test]
    fn test_issued_token_decodes_with_same_secret() {
        let auth = auth();
        let token = issue_token(&auth, &AdminClaims::admin("admin", 60)).unwrap();

        let data = decode::<AdminClaims>(
            &token,
            &DecodingKey::from_secret(auth.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .unwrap();
        assert_eq!(data.claims.sub, "admin");
        assert_eq!(data.claims.role, ADMIN_ROLE);

        let wrong = decode::<AdminClaims>(
            &token,
            &DecodingKey::from_secret(b"another-secret"),
            &Validation::default(),
        );
        assert!(wrong.is_err());
    }
}
