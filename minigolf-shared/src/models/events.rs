use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pii::Masked;

/// Emitted once a booking has passed the admission check and been committed.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BookingConfirmedEvent {
    pub booking_id: Uuid,
    pub session_id: Uuid,
    pub customer_email: Masked<String>,
    pub number_of_people: i32,
    pub total_price: i64,
    pub timestamp: DateTime<Utc>,
}

/// Emitted when an admission attempt is turned away by the capacity or availability rules.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BookingRejectedEvent {
    pub session_id: Uuid,
    pub number_of_people: i32,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BookingStatusChangedEvent {
    pub booking_id: Uuid,
    pub from: String,
    pub to: String,
    pub changed_by: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ContactSubmittedEvent {
    pub submission_id: Uuid,
    pub email: Masked<String>,
    pub subject: String,
    pub timestamp: DateTime<Utc>,
}
