pub mod admission;
pub mod booking;
pub mod contact;
pub mod course;
pub mod repository;
pub mod session;
pub mod validation;

use minigolf_catalog::{CapacityError, PricingError};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("Session is not available")]
    Unavailable,
    #[error("Not enough available slots: requested {requested}, remaining {remaining}")]
    CapacityExceeded { requested: i32, remaining: i64 },
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Persistence error: {0}")]
    PersistenceError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl From<CapacityError> for CoreError {
    fn from(err: CapacityError) -> Self {
        match err {
            CapacityError::Exceeded { requested, remaining } => {
                CoreError::CapacityExceeded { requested, remaining }
            }
        }
    }
}

impl From<PricingError> for CoreError {
    fn from(err: PricingError) -> Self {
        CoreError::ValidationError(err.to_string())
    }
}
