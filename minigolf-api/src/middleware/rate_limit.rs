use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use minigolf_store::redis_repo::rate_limit_key;

use crate::error::AppError;
use crate::state::AppState;

/// Per-IP fixed window backed by Redis. Without Redis, or when Redis errors,
/// requests go through.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(redis) = state.redis.as_ref() else {
        return Ok(next.run(req).await);
    };

    let client = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let limit = &state.rate_limit;
    match redis
        .check_rate_limit(&rate_limit_key(&client), limit.requests_per_window, limit.window_seconds)
        .await
    {
        Ok(true) => Ok(next.run(req).await),
        Ok(false) => {
            tracing::warn!("Rate limit exceeded for {}", client);
            Err(AppError::RateLimited)
        }
        Err(e) => {
            tracing::warn!("Rate limiter unavailable, failing open: {}", e);
            Ok(next.run(req).await)
        }
    }
}
