//! Queue job types.

use std::time::Duration;

use chrono::{DateTime, Utc};

use common::{JobId, OrderId, UserId};

/// Lifecycle state of a queued job.
///
/// `Failed` is the terminal dead-letter state reached after exhausting
/// the attempt budget; such jobs are never retried again but stay
/// visible for operational follow-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Active,
    Completed,
    Failed,
}

impl JobStatus {
    /// Returns the storage name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Active => "active",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "active" => Ok(JobStatus::Active),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(format!("unknown job status: {other}")),
        }
    }
}

/// Payload for enqueueing a notification job.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub order_id: OrderId,
    pub user_id: UserId,
    /// Type tag, e.g. `order_created` or `order_confirmed`.
    pub kind: String,
    pub message: String,
}

/// Delivery attempt budget and backoff for an enqueued job.
#[derive(Debug, Clone)]
pub struct EnqueueOptions {
    /// Total attempts before the job goes dead.
    pub max_attempts: i32,
    /// Base of the exponential backoff between attempts.
    pub backoff_base: Duration,
}

impl Default for EnqueueOptions {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_millis(1000),
        }
    }
}

/// A queue-resident notification job.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationJob {
    pub id: JobId,
    pub order_id: OrderId,
    pub user_id: UserId,
    pub kind: String,
    pub message: String,
    pub status: JobStatus,
    /// Attempts consumed so far; incremented when a worker claims the job.
    pub attempts: i32,
    pub max_attempts: i32,
    pub backoff_base_ms: i64,
    /// Earliest time the job may be claimed.
    pub run_at: DateTime<Utc>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NotificationJob {
    /// Delay before the next attempt: `base * 2^(attempts - 1)`.
    pub fn next_backoff(&self) -> chrono::Duration {
        let exp = (self.attempts - 1).clamp(0, 20) as u32;
        let ms = self.backoff_base_ms.saturating_mul(1 << exp);
        chrono::Duration::milliseconds(ms)
    }

    /// True when the attempt budget is exhausted.
    pub fn exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }
}
