use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use minigolf_core::session::OpenSession;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::AppQuery;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionsQuery {
    pub track_id: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/sessions", get(list_sessions))
}

/// Bookable sessions of a track, soonest first.
async fn list_sessions(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<SessionsQuery>,
) -> Result<Json<Vec<OpenSession>>, AppError> {
    let track_id = query
        .track_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation("trackId is required".to_string()))?;
    let track_id = Uuid::parse_str(track_id)
        .map_err(|_| AppError::Validation("trackId is not a valid id".to_string()))?;

    let today = Utc::now().date_naive();
    Ok(Json(state.catalog.list_open_sessions(track_id, today).await?))
}
