/// A computed price for one booking. All amounts are in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceQuote {
    pub price_per_person: i64,
    pub number_of_people: i32,
    pub total_price: i64,
}

/// Session pricing.
///
/// The price source is the session record itself: the total is the per-person
/// price times the party size. There are no taxes, fees or discount tiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct PricingEngine;

impl PricingEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn quote(&self, price_per_person: i64, number_of_people: i32) -> Result<PriceQuote, PricingError> {
        if price_per_person < 0 {
            return Err(PricingError::NegativePrice(price_per_person));
        }
        if number_of_people < 1 {
            return Err(PricingError::EmptyParty(number_of_people));
        }

        let total_price = price_per_person
            .checked_mul(i64::from(number_of_people))
            .ok_or(PricingError::Overflow {
                price_per_person,
                number_of_people,
            })?;

        Ok(PriceQuote {
            price_per_person,
            number_of_people,
            total_price,
        })
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PricingError {
    #[error("Price per person cannot be negative: {0}")]
    NegativePrice(i64),

    #[error("Party size must be at least 1, got {0}")]
    EmptyParty(i32),

    #[error("Total price overflows: {price_per_person} x {number_of_people}")]
    Overflow {
        price_per_person: i64,
        number_of_people: i32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_is_exact_product() {
        let engine = PricingEngine::new();

        let quote = engine.quote(1250, 4).unwrap();
        assert_eq!(quote.total_price, 5000);
        assert_eq!(quote.price_per_person, 1250);
        assert_eq!(quote.number_of_people, 4);

        // Free sessions stay free
        assert_eq!(engine.quote(0, 6).unwrap().total_price, 0);
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let engine = PricingEngine::new();

        assert_eq!(engine.quote(-1, 2), Err(PricingError::NegativePrice(-1)));
        assert_eq!(engine.quote(1000, 0), Err(PricingError::EmptyParty(0)));
        assert!(matches!(
            engine.quote(i64::MAX, 2),
            Err(PricingError::Overflow { .. })
        ));
    }
}
