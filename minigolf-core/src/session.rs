use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use minigolf_catalog::SlotLedger;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CoreError, CoreResult};

/// A bookable time slot on a track. Not related to authentication sessions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: Uuid,
    pub track_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    /// Capacity in players.
    pub available_slots: i32,
    /// Cents.
    pub price_per_person: i64,
    pub is_available: bool,
    pub is_cancelled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Whether the public booking flow may offer this session.
    pub fn is_open_on(&self, today: NaiveDate) -> bool {
        self.is_available && !self.is_cancelled && self.date >= today
    }

    pub fn sort_key(&self) -> (NaiveDate, NaiveTime) {
        (self.date, self.start_time)
    }
}

/// Session as listed to customers, with what is left to book.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OpenSession {
    #[serde(flatten)]
    pub session: Session,
    pub remaining_slots: i64,
}

impl OpenSession {
    pub fn new(session: Session, ledger: &SlotLedger) -> Self {
        Self {
            session,
            remaining_slots: ledger.remaining(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub price_per_person: i64,
}

impl From<&Session> for SessionSummary {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id,
            date: session.date,
            start_time: session.start_time,
            end_time: session.end_time,
            price_per_person: session.price_per_person,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSession {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub available_slots: i32,
    pub price_per_person: i64,
    #[serde(default = "default_available")]
    pub is_available: bool,
}

fn default_available() -> bool {
    true
}

impl NewSession {
    pub fn validate(self) -> CoreResult<Self> {
        if self.end_time <= self.start_time {
            return Err(CoreError::ValidationError("endTime must be after startTime".to_string()));
        }
        check_slots(self.available_slots)?;
        check_price(self.price_per_person)?;
        Ok(self)
    }
}

/// Partial admin update of a session.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionUpdate {
    pub is_available: Option<bool>,
    pub is_cancelled: Option<bool>,
    pub available_slots: Option<i32>,
    pub price_per_person: Option<i64>,
}

impl SessionUpdate {
    pub fn validate(self) -> CoreResult<Self> {
        if self.is_available.is_none()
            && self.is_cancelled.is_none()
            && self.available_slots.is_none()
            && self.price_per_person.is_none()
        {
            return Err(CoreError::ValidationError("Nothing to update".to_string()));
        }
        if let Some(slots) = self.available_slots {
            check_slots(slots)?;
        }
        if let Some(price) = self.price_per_person {
            check_price(price)?;
        }
        Ok(self)
    }

    /// Apply to `session`, refusing to shrink capacity below what is already booked.
    /// The caller must hold the session lock while `ledger` is current.
    pub fn apply(&self, session: &mut Session, ledger: &SlotLedger) -> CoreResult<()> {
        if let Some(slots) = self.available_slots {
            if !ledger.fits_within(slots) {
                return Err(CoreError::Conflict(format!(
                    "Cannot reduce capacity to {}: {} slots already booked",
                    slots, ledger.booked
                )));
            }
            session.available_slots = slots;
        }
        if let Some(price) = self.price_per_person {
            session.price_per_person = price;
        }
        if let Some(available) = self.is_available {
            session.is_available = available;
        }
        if let Some(cancelled) = self.is_cancelled {
            session.is_cancelled = cancelled;
        }
        session.updated_at = Utc::now();
        Ok(())
    }
}

fn check_slots(slots: i32) -> CoreResult<()> {
    if slots < 0 {
        return Err(CoreError::ValidationError("availableSlots cannot be negative".to_string()));
    }
    Ok(())
}

fn check_price(price: i64) -> CoreResult<()> {
    if price < 0 {
        return Err(CoreError::ValidationError("pricePerPerson cannot be negative".to_string()));
    }
    Ok(())
}
