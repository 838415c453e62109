use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::Utc;
use minigolf_core::contact::{ContactRequest, ContactStatus, ContactSubmission};
use minigolf_shared::models::events::ContactSubmittedEvent;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::bookings::StatusFilter;
use crate::error::AppError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ContactStatusUpdate {
    pub status: ContactStatus,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/contact", post(submit_contact))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/contact", get(list_submissions))
        .route("/api/admin/contact/{id}/status", patch(update_status))
}

async fn submit_contact(
    State(state): State<AppState>,
    AppJson(req): AppJson<ContactRequest>,
) -> Result<(StatusCode, Json<ContactSubmission>), AppError> {
    // Validation happens before the store is touched.
    let submission = req.validate()?;
    let saved = state.contacts.create_submission(&submission).await?;

    let event = ContactSubmittedEvent {
        submission_id: saved.id,
        email: saved.email.clone(),
        subject: saved.subject.clone(),
        timestamp: Utc::now(),
    };
    info!("Contact submitted: {:?}", event);

    Ok((StatusCode::CREATED, Json(saved)))
}

async fn list_submissions(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<StatusFilter>,
) -> Result<Json<Vec<ContactSubmission>>, AppError> {
    let status = filter.parse::<ContactStatus>()?;
    Ok(Json(state.contacts.list_submissions(status).await?))
}

async fn update_status(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<ContactStatusUpdate>,
) -> Result<Json<ContactSubmission>, AppError> {
    Ok(Json(state.contacts.update_submission_status(id, req.status).await?))
}
