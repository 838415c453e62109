use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use minigolf_core::booking::{Booking, BookingConfirmation, BookingRequest, BookingStatus};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::middleware::AdminClaims;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusFilter {
    pub status: Option<String>,
}

impl StatusFilter {
    pub fn parse<T>(&self) -> Result<Option<T>, AppError>
    where
        T: std::str::FromStr<Err = minigolf_core::CoreError>,
    {
        self.status
            .as_deref()
            .map(|s| s.parse::<T>())
            .transpose()
            .map_err(AppError::from)
    }
}

#[derive(Debug, Deserialize)]
pub struct BookingStatusUpdate {
    pub status: BookingStatus,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/bookings", post(create_booking))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/bookings", get(list_bookings))
        .route("/api/admin/bookings/{id}/status", patch(update_status))
}

async fn create_booking(
    State(state): State<AppState>,
    AppJson(req): AppJson<BookingRequest>,
) -> Result<(StatusCode, Json<BookingConfirmation>), AppError> {
    let confirmation = state.bookings.attempt_booking(&req).await?;
    Ok((StatusCode::CREATED, Json(confirmation)))
}

async fn list_bookings(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<StatusFilter>,
) -> Result<Json<Vec<BookingConfirmation>>, AppError> {
    let status = filter.parse::<BookingStatus>()?;
    Ok(Json(state.bookings.list_bookings(status).await?))
}

async fn update_status(
    State(state): State<AppState>,
    Extension(claims): Extension<AdminClaims>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<BookingStatusUpdate>,
) -> Result<Json<Booking>, AppError> {
    let booking = state.bookings.change_status(id, req.status, &claims.sub).await?;
    Ok(Json(booking))
}
