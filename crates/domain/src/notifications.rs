//! Queue-side notification processing.
//!
//! The [`NotificationProcessor`] consumes claimed jobs: it persists one
//! notification row and then simulates the outbound delivery with a
//! per-type delay. How the row is written goes through the
//! [`NotificationWriter`] seam, so the delivery guarantee can be changed
//! without touching the queue or the order service: [`AppendWriter`]
//! gives at-least-once (a crash between insert and completion leads to a
//! duplicate row on retry), [`IdempotentWriter`] dedupes on job id and
//! makes redelivery invisible.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use queue::{JobProcessor, NotificationJob, ProcessError};
use store::{NewNotification, Notification, NotificationStore};

/// Persists one notification row for a claimed job.
#[async_trait]
pub trait NotificationWriter: Send + Sync {
    async fn record(&self, new: NewNotification) -> store::Result<Notification>;
}

/// Append-only writer. Every delivery attempt that reaches the write
/// produces a row, so a retry after a post-insert failure duplicates the
/// notification.
pub struct AppendWriter<S> {
    store: Arc<S>,
}

impl<S> AppendWriter<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: NotificationStore> NotificationWriter for AppendWriter<S> {
    async fn record(&self, new: NewNotification) -> store::Result<Notification> {
        self.store.insert_notification(new).await
    }
}

/// Writer that keys rows on the job id: a redelivered job finds its
/// existing row instead of inserting a second one.
pub struct IdempotentWriter<S> {
    store: Arc<S>,
}

impl<S> IdempotentWriter<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: NotificationStore> NotificationWriter for IdempotentWriter<S> {
    async fn record(&self, new: NewNotification) -> store::Result<Notification> {
        self.store.insert_notification_unique(new).await
    }
}

/// Simulated delivery latency per notification type.
#[derive(Debug, Clone)]
pub struct DeliveryDelays {
    pub confirmed: Duration,
    pub preparing: Duration,
    pub ready: Duration,
    pub other: Duration,
}

impl Default for DeliveryDelays {
    fn default() -> Self {
        Self {
            confirmed: Duration::from_millis(500),
            preparing: Duration::from_millis(700),
            ready: Duration::from_millis(1000),
            other: Duration::from_millis(300),
        }
    }
}

impl DeliveryDelays {
    /// No artificial latency. Meant for tests.
    pub fn zero() -> Self {
        Self {
            confirmed: Duration::ZERO,
            preparing: Duration::ZERO,
            ready: Duration::ZERO,
            other: Duration::ZERO,
        }
    }

    /// Delay for a job type tag such as `order_confirmed`.
    pub fn for_kind(&self, kind: &str) -> Duration {
        match kind {
            "order_confirmed" => self.confirmed,
            "order_preparing" => self.preparing,
            "order_ready" => self.ready,
            _ => self.other,
        }
    }
}

/// Turns claimed queue jobs into notification rows.
///
/// Write failures propagate to the worker so the job gets retried;
/// this processor never swallows an error.
pub struct NotificationProcessor<W> {
    writer: W,
    delays: DeliveryDelays,
}

impl<W> NotificationProcessor<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            delays: DeliveryDelays::default(),
        }
    }

    pub fn with_delays(mut self, delays: DeliveryDelays) -> Self {
        self.delays = delays;
        self
    }
}

#[async_trait]
impl<W: NotificationWriter> JobProcessor for NotificationProcessor<W> {
    async fn process(&self, job: &NotificationJob) -> std::result::Result<(), ProcessError> {
        let notification = self
            .writer
            .record(NewNotification {
                order_id: job.order_id,
                job_id: Some(job.id),
                kind: job.kind.clone(),
                message: job.message.clone(),
            })
            .await?;

        metrics::counter!("notifications_recorded_total").increment(1);
        tracing::info!(
            notification_id = %notification.id,
            order_id = %job.order_id,
            kind = %job.kind,
            "notification recorded"
        );

        // Stand-in for the real outbound channel (mail, push, ...).
        tokio::time::sleep(self.delays.for_kind(&job.kind)).await;

        Ok(())
    }
}
