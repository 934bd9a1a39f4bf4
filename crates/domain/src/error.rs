//! Domain error types.

use store::StoreError;
use thiserror::Error;

/// Errors produced by the order and booking services.
///
/// Every variant maps onto one HTTP status at the API boundary:
/// Validation → 400, NotFound → 404, Authorization → 403,
/// Conflict → 409, Store → 500.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The request payload is missing data or carries invalid values.
    #[error("{0}")]
    Validation(String),

    /// The addressed entity does not exist (or is hidden from the caller).
    #[error("{0}")]
    NotFound(String),

    /// The caller's role or ownership does not permit the operation.
    #[error("{0}")]
    Authorization(String),

    /// The operation lost to a concurrent competitor, e.g. a booking slot
    /// taken between request and insert.
    #[error("{0}")]
    Conflict(String),

    /// The storage layer failed.
    #[error("storage error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for DomainError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateSlot => {
                DomainError::Conflict("This time slot is already booked".to_string())
            }
            other => DomainError::Store(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;
