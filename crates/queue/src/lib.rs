//! Durable notification job queue.
//!
//! Decouples order-mutation latency from notification delivery. Jobs are
//! persisted by a [`JobStore`] (PostgreSQL or in-memory), claimed by at
//! most one worker at a time, retried with exponential backoff up to a
//! bounded attempt budget, and moved to a terminal dead state afterwards
//! instead of being dropped. Completion and failure are observable both
//! as tracing/metrics and as broadcast [`QueueEvent`]s.
//!
//! The queue is a plain value constructed once at startup and handed to
//! whoever needs it; there is no global instance.

mod error;
mod job;
mod memory;
mod postgres;
mod queue;
mod store;
mod worker;

pub use error::{QueueError, Result};
pub use job::{EnqueueOptions, JobStatus, NewJob, NotificationJob};
pub use memory::MemoryJobStore;
pub use postgres::PostgresJobStore;
pub use queue::{NotificationQueue, QueueEvent};
pub use store::JobStore;
pub use worker::{JobProcessor, ProcessError, QueueWorker};
