use thiserror::Error;

use common::JobId;

/// Errors that can occur in the notification queue.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The referenced job does not exist.
    #[error("job not found: {0}")]
    JobNotFound(JobId),

    /// A stored value could not be decoded into its queue type.
    #[error("invalid stored value: {0}")]
    Decode(String),

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for queue operations.
pub type Result<T> = std::result::Result<T, QueueError>;
