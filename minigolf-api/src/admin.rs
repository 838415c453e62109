use axum::{
    extract::State,
    http::StatusCode,
    routing::{patch, post},
    Extension, Json, Router,
};
use minigolf_core::course::{GolfCourse, NewCourse, NewTrack, Track};
use minigolf_core::session::{NewSession, Session, SessionUpdate};
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::{AppJson, AppPath};
use crate::middleware::AdminClaims;
use crate::state::AppState;

// ============================================================================
// Catalog maintenance
// ============================================================================

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/courses", post(create_course))
        .route("/api/admin/courses/{id}/tracks", post(create_track))
        .route("/api/admin/tracks/{id}/sessions", post(create_session))
        .route("/api/admin/sessions/{id}", patch(update_session))
}

/// POST /api/admin/courses
async fn create_course(
    State(state): State<AppState>,
    AppJson(req): AppJson<NewCourse>,
) -> Result<(StatusCode, Json<GolfCourse>), AppError> {
    let course = req.validate()?;
    let created = state.catalog.create_course(&course).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// POST /api/admin/courses/{id}/tracks
async fn create_track(
    State(state): State<AppState>,
    AppPath(course_id): AppPath<Uuid>,
    AppJson(req): AppJson<NewTrack>,
) -> Result<(StatusCode, Json<Track>), AppError> {
    let track = req.validate()?;
    let created = state.catalog.create_track(course_id, &track).await?;
    info!("Track created: {} on course {}", created.name, course_id);
    Ok((StatusCode::CREATED, Json(created)))
}

/// POST /api/admin/tracks/{id}/sessions
async fn create_session(
    State(state): State<AppState>,
    AppPath(track_id): AppPath<Uuid>,
    AppJson(req): AppJson<NewSession>,
) -> Result<(StatusCode, Json<Session>), AppError> {
    let session = req.validate()?;
    let created = state.catalog.create_session(track_id, &session).await?;
    info!(
        "Session created: {} on {} at {} ({} slots)",
        created.id, created.date, created.start_time, created.available_slots
    );
    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH /api/admin/sessions/{id}
async fn update_session(
    State(state): State<AppState>,
    Extension(claims): Extension<AdminClaims>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<SessionUpdate>,
) -> Result<Json<Session>, AppError> {
    let update = req.validate()?;
    let session = state.catalog.update_session(id, &update).await?;
    if update.is_cancelled == Some(true) {
        tracing::warn!("Session {} cancelled by {}", id, claims.sub);
    }
    Ok(Json(session))
}
