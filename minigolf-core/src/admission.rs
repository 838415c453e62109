//! The admission rule for new bookings.
//!
//! Stores call [`admit`] while they hold the session lock, with a snapshot
//! whose `booked_slots` was summed under that same lock. The check and the
//! insert that follows are therefore a single atomic step per session.

use chrono::NaiveDate;
use minigolf_catalog::{PriceQuote, PricingEngine, SlotLedger};
use uuid::Uuid;

use crate::session::Session;
use crate::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionCapacity {
    pub session_id: Uuid,
    pub date: NaiveDate,
    pub available_slots: i32,
    pub price_per_person: i64,
    pub is_available: bool,
    pub is_cancelled: bool,
    /// Sum of `number_of_people` over the session's non-cancelled bookings.
    pub booked_slots: i64,
}

impl SessionCapacity {
    pub fn of(session: &Session, booked_slots: i64) -> Self {
        Self {
            session_id: session.id,
            date: session.date,
            available_slots: session.available_slots,
            price_per_person: session.price_per_person,
            is_available: session.is_available,
            is_cancelled: session.is_cancelled,
            booked_slots,
        }
    }

    pub fn ledger(&self) -> SlotLedger {
        SlotLedger::new(self.available_slots, self.booked_slots)
    }

    /// Same conditions the public session listing applies.
    pub fn is_open_on(&self, today: NaiveDate) -> bool {
        self.is_available && !self.is_cancelled && self.date >= today
    }
}

/// Decide whether a party of `number_of_people` may book the session on
/// `today` and price it.
pub fn admit(snapshot: &SessionCapacity, number_of_people: i32, today: NaiveDate) -> CoreResult<PriceQuote> {
    if !snapshot.is_open_on(today) {
        return Err(CoreError::Unavailable);
    }

    let mut ledger = snapshot.ledger();
    ledger.admit(number_of_people)?;

    let quote = PricingEngine::new().quote(snapshot.price_per_person, number_of_people)?;
    Ok(quote)
}
