//! In-memory job store for testing and DB-less development.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use common::JobId;

use crate::job::{EnqueueOptions, JobStatus, NewJob, NotificationJob};
use crate::store::JobStore;
use crate::{QueueError, Result};

/// In-memory implementation of [`JobStore`] mirroring the claiming and
/// ordering semantics of the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct MemoryJobStore {
    jobs: Arc<RwLock<Vec<NotificationJob>>>,
}

impl MemoryJobStore {
    /// Creates a new empty job store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all jobs, in enqueue order.
    pub async fn all_jobs(&self) -> Vec<NotificationJob> {
        self.jobs.read().await.clone()
    }

    async fn update<F>(&self, id: JobId, apply: F) -> Result<()>
    where
        F: FnOnce(&mut NotificationJob),
    {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .iter_mut()
            .find(|j| j.id == id)
            .ok_or(QueueError::JobNotFound(id))?;
        apply(job);
        job.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn enqueue(&self, new: NewJob, options: &EnqueueOptions) -> Result<NotificationJob> {
        let now = Utc::now();
        let job = NotificationJob {
            id: JobId::new(),
            order_id: new.order_id,
            user_id: new.user_id,
            kind: new.kind,
            message: new.message,
            status: JobStatus::Pending,
            attempts: 0,
            max_attempts: options.max_attempts,
            backoff_base_ms: options.backoff_base.as_millis() as i64,
            run_at: now,
            last_error: None,
            created_at: now,
            updated_at: now,
        };
        self.jobs.write().await.push(job.clone());
        Ok(job)
    }

    async fn claim_due(&self) -> Result<Option<NotificationJob>> {
        let now = Utc::now();
        let mut jobs = self.jobs.write().await;

        // Insertion order is enqueue order, so scanning front to back
        // yields per-order FIFO.
        let mut candidate = None;
        for (i, job) in jobs.iter().enumerate() {
            if job.status != JobStatus::Pending || job.run_at > now {
                continue;
            }
            let blocked = jobs.iter().enumerate().any(|(k, other)| {
                k != i
                    && other.order_id == job.order_id
                    && (other.status == JobStatus::Active
                        || (other.status == JobStatus::Pending && k < i))
            });
            if !blocked {
                candidate = Some(i);
                break;
            }
        }

        Ok(candidate.map(|i| {
            let job = &mut jobs[i];
            job.status = JobStatus::Active;
            job.attempts += 1;
            job.updated_at = now;
            job.clone()
        }))
    }

    async fn mark_completed(&self, id: JobId) -> Result<()> {
        self.update(id, |job| job.status = JobStatus::Completed).await
    }

    async fn mark_retry(&self, id: JobId, run_at: DateTime<Utc>, error: &str) -> Result<()> {
        self.update(id, |job| {
            job.status = JobStatus::Pending;
            job.run_at = run_at;
            job.last_error = Some(error.to_string());
        })
        .await
    }

    async fn mark_dead(&self, id: JobId, error: &str) -> Result<()> {
        self.update(id, |job| {
            job.status = JobStatus::Failed;
            job.last_error = Some(error.to_string());
        })
        .await
    }

    async fn job(&self, id: JobId) -> Result<Option<NotificationJob>> {
        Ok(self.jobs.read().await.iter().find(|j| j.id == id).cloned())
    }

    async fn dead_jobs(&self) -> Result<Vec<NotificationJob>> {
        Ok(self
            .jobs
            .read()
            .await
            .iter()
            .filter(|j| j.status == JobStatus::Failed)
            .cloned()
            .collect())
    }
}
