use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use minigolf_core::course::{CourseDetail, CourseListing, Track};
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::AppPath;
use crate::state::AppState;

// Both routes name the segment `course`: a slug for the detail page, an id
// for the track list.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/courses", get(list_courses))
        .route("/api/courses/{course}", get(get_course))
        .route("/api/courses/{course}/tracks", get(list_tracks))
}

async fn list_courses(State(state): State<AppState>) -> Result<Json<Vec<CourseListing>>, AppError> {
    let today = Utc::now().date_naive();
    Ok(Json(state.catalog.list_courses(today).await?))
}

async fn get_course(
    State(state): State<AppState>,
    AppPath(slug): AppPath<String>,
) -> Result<Json<CourseDetail>, AppError> {
    let today = Utc::now().date_naive();
    state
        .catalog
        .get_course_by_slug(&slug, today)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Course '{}' not found", slug)))
}

async fn list_tracks(
    State(state): State<AppState>,
    AppPath(course_id): AppPath<Uuid>,
) -> Result<Json<Vec<Track>>, AppError> {
    Ok(Json(state.catalog.list_tracks(course_id).await?))
}
