use chrono::{DateTime, Utc};
use minigolf_catalog::PriceQuote;
use minigolf_shared::models::events::{
    BookingConfirmedEvent, BookingRejectedEvent, BookingStatusChangedEvent,
};
use minigolf_shared::Masked;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::course::{CourseSummary, TrackSummary};
use crate::repository::BookingRepository;
use crate::session::SessionSummary;
use crate::validation;
use crate::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::Cancelled => "Cancelled",
            BookingStatus::Completed => "Completed",
        }
    }

    /// Every status except `Cancelled` occupies slots on its session.
    pub fn holds_slots(&self) -> bool {
        !matches!(self, BookingStatus::Cancelled)
    }

    /// Admin lifecycle. `Cancelled` and `Completed` are terminal.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Cancelled) | (Confirmed, Completed)
        )
    }

    pub fn transition(&self, next: BookingStatus) -> CoreResult<BookingStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CoreError::Conflict(format!(
                "Booking cannot move from {} to {}",
                self, next
            )))
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(BookingStatus::Pending),
            "Confirmed" => Ok(BookingStatus::Confirmed),
            "Cancelled" => Ok(BookingStatus::Cancelled),
            "Completed" => Ok(BookingStatus::Completed),
            other => Err(CoreError::ValidationError(format!("Unknown booking status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub session_id: Uuid,
    pub customer_name: String,
    pub customer_email: Masked<String>,
    pub customer_phone: Masked<String>,
    pub notes: Option<String>,
    pub number_of_people: i32,
    /// Cents.
    pub total_price: i64,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A booking with its session, track and course, for confirmation screens
/// and the admin list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookingConfirmation {
    #[serde(flatten)]
    pub booking: Booking,
    pub session: SessionSummary,
    pub track: TrackSummary,
    pub course: CourseSummary,
}

/// Booking request as posted by the booking form. Every field is optional on
/// the wire so that a missing field surfaces as a validation error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookingRequest {
    pub session_id: Option<String>,
    pub number_of_people: Option<i32>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
}

impl BookingRequest {
    pub fn validate(&self) -> CoreResult<NewBooking> {
        let session_id = validation::required("sessionId", self.session_id.as_deref())?;
        let session_id = Uuid::parse_str(&session_id)
            .map_err(|_| CoreError::ValidationError("sessionId is not a valid id".to_string()))?;

        let number_of_people = self
            .number_of_people
            .ok_or_else(|| CoreError::ValidationError("numberOfPeople is required".to_string()))?;
        if number_of_people < 1 {
            return Err(CoreError::ValidationError("numberOfPeople must be at least 1".to_string()));
        }

        Ok(NewBooking {
            session_id,
            number_of_people,
            customer_name: validation::required("customerName", self.customer_name.as_deref())?,
            customer_email: validation::email("customerEmail", self.customer_email.as_deref())?,
            customer_phone: validation::required("customerPhone", self.customer_phone.as_deref())?,
            notes: validation::optional(self.notes.as_deref()),
        })
    }
}

/// A validated booking request, ready for the admission check.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub session_id: Uuid,
    pub number_of_people: i32,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub notes: Option<String>,
}

impl NewBooking {
    /// The row to persist once the admission check has priced the request.
    pub fn admitted(&self, quote: &PriceQuote) -> Booking {
        let now = Utc::now();
        Booking {
            id: Uuid::new_v4(),
            session_id: self.session_id,
            customer_name: self.customer_name.clone(),
            customer_email: Masked(self.customer_email.clone()),
            customer_phone: Masked(self.customer_phone.clone()),
            notes: self.notes.clone(),
            number_of_people: self.number_of_people,
            total_price: quote.total_price,
            status: BookingStatus::Confirmed,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Front door for bookings: validates, then hands the request to the store
/// which runs the admission rule atomically.
#[derive(Clone)]
pub struct BookingDesk {
    repo: Arc<dyn BookingRepository>,
}

impl BookingDesk {
    pub fn new(repo: Arc<dyn BookingRepository>) -> Self {
        Self { repo }
    }

    pub async fn attempt_booking(&self, request: &BookingRequest) -> CoreResult<BookingConfirmation> {
        let booking = request.validate()?;
        let today = Utc::now().date_naive();

        match self.repo.admit_booking(&booking, today).await {
            Ok(confirmation) => {
                let event = BookingConfirmedEvent {
                    booking_id: confirmation.booking.id,
                    session_id: booking.session_id,
                    customer_email: confirmation.booking.customer_email.clone(),
                    number_of_people: booking.number_of_people,
                    total_price: confirmation.booking.total_price,
                    timestamp: Utc::now(),
                };
                info!("Booking confirmed: {:?}", event);
                Ok(confirmation)
            }
            Err(err @ (CoreError::Unavailable | CoreError::CapacityExceeded { .. })) => {
                let event = BookingRejectedEvent {
                    session_id: booking.session_id,
                    number_of_people: booking.number_of_people,
                    reason: err.to_string(),
                    timestamp: Utc::now(),
                };
                info!("Booking rejected: {:?}", event);
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    pub async fn list_bookings(&self, status: Option<BookingStatus>) -> CoreResult<Vec<BookingConfirmation>> {
        self.repo.list_bookings(status).await
    }

    pub async fn change_status(&self, id: Uuid, next: BookingStatus, changed_by: &str) -> CoreResult<Booking> {
        let (previous, booking) = self.repo.update_booking_status(id, next).await?;
        if previous == BookingStatus::Confirmed && next == BookingStatus::Cancelled {
            warn!("Booking {} cancelled, {} slots released", id, booking.number_of_people);
        }
        let event = BookingStatusChangedEvent {
            booking_id: id,
            from: previous.to_string(),
            to: next.to_string(),
            changed_by: changed_by.to_string(),
            timestamp: Utc::now(),
        };
        info!("Booking status changed: {:?}", event);
        Ok(booking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingRepository {
        calls: AtomicUsize,
        outcome: fn() -> CoreResult<()>,
    }

    impl CountingRepository {
        fn new(outcome: fn() -> CoreResult<()>) -> Arc<Self> {
            Arc::new(Self { calls: AtomicUsize::new(0), outcome })
        }
    }

    fn confirmation_for(booking: &NewBooking) -> BookingConfirmation {
        let quote = minigolf_catalog::PricingEngine::new()
            .quote(1000, booking.number_of_people)
            .unwrap();
        let admitted = booking.admitted(&quote);
        BookingConfirmation {
            session: SessionSummary {
                id: booking.session_id,
                date: chrono::NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
                start_time: chrono::NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
                end_time: chrono::NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
                price_per_person: 1000,
            },
            track: TrackSummary {
                id: Uuid::new_v4(),
                name: "Classic Course".to_string(),
                holes: 18,
                difficulty: crate::course::Difficulty::Easy,
            },
            course: CourseSummary {
                id: Uuid::new_v4(),
                name: "Kimball Farm Mini Golf".to_string(),
                slug: "kimball-farm".to_string(),
                city: "Westford".to_string(),
            },
            booking: admitted,
        }
    }

    #[async_trait]
    impl BookingRepository for CountingRepository {
        async fn admit_booking(&self, booking: &NewBooking, _today: chrono::NaiveDate) -> CoreResult<BookingConfirmation> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.outcome)()?;
            Ok(confirmation_for(booking))
        }

        async fn list_bookings(&self, _status: Option<BookingStatus>) -> CoreResult<Vec<BookingConfirmation>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn update_booking_status(
            &self,
            id: Uuid,
            _status: BookingStatus,
        ) -> CoreResult<(BookingStatus, Booking)> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(CoreError::NotFound(format!("Booking {}", id)))
        }
    }

    fn valid_request() -> BookingRequest {
        BookingRequest {
            session_id: Some(Uuid::new_v4().to_string()),
            number_of_people: Some(3),
            customer_name: Some("Jane Doe".to_string()),
            customer_email: Some("jane@example.com".to_string()),
            customer_phone: Some("508-555-0100".to_string()),
            notes: Some("  ".to_string()),
        }
    }

    #[test]
    fn test_validate_normalizes_request() {
        let booking = valid_request().validate().unwrap();
        assert_eq!(booking.number_of_people, 3);
        assert_eq!(booking.notes, None);
    }

    #[test]
    fn test_validate_rejects_bad_party_and_id() {
        let mut req = valid_request();
        req.number_of_people = Some(0);
        assert!(matches!(req.validate(), Err(CoreError::ValidationError(_))));

        let mut req = valid_request();
        req.session_id = Some("not-a-uuid".to_string());
        assert!(matches!(req.validate(), Err(CoreError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_missing_contact_field_never_reaches_store() {
        let repo = CountingRepository::new(|| Ok(()));
        let desk = BookingDesk::new(repo.clone());

        for strip in 0..3 {
            let mut req = valid_request();
            match strip {
                0 => req.customer_name = None,
                1 => req.customer_email = Some("".to_string()),
                _ => req.customer_phone = Some("   ".to_string()),
            }
            let err = desk.attempt_booking(&req).await.unwrap_err();
            assert!(matches!(err, CoreError::ValidationError(_)));
        }

        assert_eq!(repo.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_store_rejections_pass_through() {
        let repo = CountingRepository::new(|| Err(CoreError::Unavailable));
        let desk = BookingDesk::new(repo.clone());

        let err = desk.attempt_booking(&valid_request()).await.unwrap_err();
        assert!(matches!(err, CoreError::Unavailable));
        assert_eq!(repo.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_confirmed_booking_is_priced() {
        let desk = BookingDesk::new(CountingRepository::new(|| Ok(())));
        let confirmation = desk.attempt_booking(&valid_request()).await.unwrap();
        assert_eq!(confirmation.booking.status, BookingStatus::Confirmed);
        assert_eq!(confirmation.booking.total_price, 3000);
    }

    #[test]
    fn test_status_lifecycle() {
        use BookingStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Completed));
        assert!(!Cancelled.can_transition_to(Confirmed));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Confirmed.can_transition_to(Confirmed));
        assert!(matches!(Completed.transition(Pending), Err(CoreError::Conflict(_))));

        assert!(Pending.holds_slots());
        assert!(!Cancelled.holds_slots());
    }

    #[test]
    fn test_confirmation_serializes_flat_camel_case() {
        let booking = valid_request().validate().unwrap();
        let json = serde_json::to_value(confirmation_for(&booking)).unwrap();
        assert_eq!(json["numberOfPeople"], 3);
        assert_eq!(json["totalPrice"], 3000);
        assert_eq!(json["status"], "Confirmed");
        assert_eq!(json["customerEmail"], "jane@example.com");
        assert_eq!(json["course"]["slug"], "kimball-farm");
    }
}
