use thiserror::Error;

/// Errors that can occur in the persistence gateway.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Another non-cancelled booking already holds the slot. Raised by the
    /// partial unique index on (restaurant_id, date, time).
    #[error("booking slot is already taken")]
    DuplicateSlot,

    /// A stored value could not be decoded into its domain type.
    #[error("invalid stored value: {0}")]
    Decode(String),

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
