//! Storage trait for queue jobs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use common::JobId;

use crate::job::{EnqueueOptions, NewJob, NotificationJob};
use crate::Result;

/// Durable storage for notification jobs.
///
/// Claiming must be atomic: a job handed to one caller is never handed
/// to another until it is released by a retry, and jobs for the same
/// order are handed out strictly in enqueue order.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Admits a job with the given attempt budget and backoff.
    async fn enqueue(&self, new: NewJob, options: &EnqueueOptions) -> Result<NotificationJob>;

    /// Atomically claims the oldest due pending job whose order has no
    /// active or earlier pending job, marking it active and consuming
    /// one attempt. Returns `None` when nothing is runnable.
    ///
    /// There is no lease timeout: a job left active by a worker that died
    /// mid-flight is never reclaimed, and because active jobs block later
    /// jobs for the same order, that order's queue stalls with it. Workers
    /// must resolve every claim with [`mark_completed`](Self::mark_completed),
    /// [`mark_retry`](Self::mark_retry), or [`mark_dead`](Self::mark_dead).
    async fn claim_due(&self) -> Result<Option<NotificationJob>>;

    /// Marks a claimed job as successfully completed.
    async fn mark_completed(&self, id: JobId) -> Result<()>;

    /// Releases a claimed job for another attempt at `run_at`.
    async fn mark_retry(&self, id: JobId, run_at: DateTime<Utc>, error: &str) -> Result<()>;

    /// Moves a claimed job to the terminal dead state.
    async fn mark_dead(&self, id: JobId, error: &str) -> Result<()>;

    /// Fetches one job by id.
    async fn job(&self, id: JobId) -> Result<Option<NotificationJob>>;

    /// All jobs in the terminal dead state, oldest first.
    async fn dead_jobs(&self) -> Result<Vec<NotificationJob>>;
}
