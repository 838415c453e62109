pub mod pricing;
pub mod capacity;

pub use pricing::{PriceQuote, PricingEngine, PricingError};
pub use capacity::{CapacityError, SlotLedger};
