//! The queue service object.

use tokio::sync::broadcast;

use common::{JobId, OrderId};

use crate::job::{EnqueueOptions, NewJob, NotificationJob};
use crate::store::JobStore;
use crate::Result;

/// Completion and failure notifications, keyed by job and order id.
#[derive(Debug, Clone, PartialEq)]
pub enum QueueEvent {
    /// The job's processor ran to completion.
    Completed { job_id: JobId, order_id: OrderId },
    /// One attempt failed. `will_retry` is false on the final attempt.
    Failed {
        job_id: JobId,
        order_id: OrderId,
        attempt: i32,
        will_retry: bool,
    },
    /// The job exhausted its attempt budget and went dead.
    Dead {
        job_id: JobId,
        order_id: OrderId,
        attempts: i32,
    },
}

/// Handle to the notification queue.
///
/// Constructed once at startup and passed by reference or clone to the
/// order service (producer side) and the worker (consumer side).
#[derive(Clone)]
pub struct NotificationQueue<J> {
    store: J,
    events: broadcast::Sender<QueueEvent>,
}

impl<J: JobStore> NotificationQueue<J> {
    /// Creates a queue over the given job store.
    pub fn new(store: J) -> Self {
        let (events, _) = broadcast::channel(256);
        Self { store, events }
    }

    /// Admits a job with the default attempt budget and backoff.
    pub async fn enqueue(&self, new: NewJob) -> Result<JobId> {
        self.enqueue_with(new, EnqueueOptions::default()).await
    }

    /// Admits a job with explicit options. Returns the job id for
    /// correlation.
    pub async fn enqueue_with(&self, new: NewJob, options: EnqueueOptions) -> Result<JobId> {
        let job = self.store.enqueue(new, &options).await?;
        metrics::counter!("notification_jobs_enqueued_total").increment(1);
        tracing::info!(
            job_id = %job.id,
            order_id = %job.order_id,
            kind = %job.kind,
            "notification job enqueued"
        );
        Ok(job.id)
    }

    /// Subscribes to completion/failure events.
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.events.subscribe()
    }

    /// Fetches one job by id.
    pub async fn job(&self, id: JobId) -> Result<Option<NotificationJob>> {
        self.store.job(id).await
    }

    /// Terminally failed jobs awaiting operator attention.
    pub async fn dead_jobs(&self) -> Result<Vec<NotificationJob>> {
        self.store.dead_jobs().await
    }

    pub(crate) fn store(&self) -> &J {
        &self.store
    }

    pub(crate) fn emit(&self, event: QueueEvent) {
        // Nobody listening is fine; events are purely observational.
        let _ = self.events.send(event);
    }
}
