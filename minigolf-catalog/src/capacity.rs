/// Slot accounting for a single session.
///
/// The ledger is always rebuilt from the party sizes of the session's
/// non-cancelled bookings; nothing keeps a running counter between requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotLedger {
    pub capacity: i64,
    pub booked: i64,
}

impl SlotLedger {
    pub fn new(capacity: i32, booked: i64) -> Self {
        Self {
            capacity: i64::from(capacity),
            booked,
        }
    }

    pub fn remaining(&self) -> i64 {
        (self.capacity - self.booked).max(0)
    }

    pub fn can_admit(&self, party: i32) -> bool {
        party >= 1 && self.booked + i64::from(party) <= self.capacity
    }

    /// Take `party` slots or fail without touching the ledger.
    pub fn admit(&mut self, party: i32) -> Result<(), CapacityError> {
        if !self.can_admit(party) {
            return Err(CapacityError::Exceeded {
                requested: party,
                remaining: self.remaining(),
            });
        }
        self.booked += i64::from(party);
        Ok(())
    }

    /// Whether the session could shrink to `capacity` without overbooking it.
    pub fn fits_within(&self, capacity: i32) -> bool {
        self.booked <= i64::from(capacity)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CapacityError {
    #[error("Not enough available slots: requested {requested}, remaining {remaining}")]
    Exceeded { requested: i32, remaining: i64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admit_until_full() {
        let mut ledger = SlotLedger::new(10, 5);
        assert_eq!(ledger.remaining(), 5);

        ledger.admit(5).unwrap();
        assert_eq!(ledger.remaining(), 0);

        let err = ledger.admit(1).unwrap_err();
        assert_eq!(err, CapacityError::Exceeded { requested: 1, remaining: 0 });
        assert_eq!(ledger.booked, 10);
    }

    #[test]
    fn test_exact_fit_is_admitted() {
        let ledger = SlotLedger::new(8, 0);
        assert!(ledger.can_admit(8));
        assert!(!ledger.can_admit(9));
        assert!(!ledger.can_admit(0));
    }

    #[test]
    fn test_fits_within_smaller_capacity() {
        let ledger = SlotLedger::new(20, 8);
        assert!(ledger.fits_within(8));
        assert!(!ledger.fits_within(7));
    }

    #[test]
    fn test_overbooked_ledger_has_nothing_left() {
        let ledger = SlotLedger::new(4, 6);
        assert_eq!(ledger.remaining(), 0);
        assert!(!ledger.can_admit(1));
        assert!(!SlotLedger::new(0, 0).can_admit(1));
    }
}
