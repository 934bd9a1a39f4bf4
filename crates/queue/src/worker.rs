//! Queue worker: claims jobs, runs the processor, drives retry.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::job::NotificationJob;
use crate::queue::{NotificationQueue, QueueEvent};
use crate::store::JobStore;
use crate::Result;

/// Error produced by a job processor. The worker only needs to record
/// and log it, so any error type will do.
pub type ProcessError = Box<dyn std::error::Error + Send + Sync>;

/// A consumer of queued jobs.
///
/// Implementations must let processing errors propagate: the worker
/// translates them into retries, and a swallowed error would count as
/// a success.
#[async_trait]
pub trait JobProcessor: Send + Sync {
    async fn process(&self, job: &NotificationJob) -> std::result::Result<(), ProcessError>;
}

/// Polls the job store and feeds claimed jobs to the processor.
///
/// Multiple workers may run over the same store; claiming is atomic, so
/// a job is executed by at most one worker at a time.
pub struct QueueWorker<J, P> {
    queue: NotificationQueue<J>,
    processor: Arc<P>,
    poll_interval: Duration,
}

impl<J, P> QueueWorker<J, P>
where
    J: JobStore,
    P: JobProcessor,
{
    /// Creates a worker over the queue with the given processor.
    pub fn new(queue: NotificationQueue<J>, processor: Arc<P>) -> Self {
        Self {
            queue,
            processor,
            poll_interval: Duration::from_millis(200),
        }
    }

    /// Overrides the idle polling interval.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Runs the worker until the task is dropped.
    pub async fn run(self) {
        loop {
            match self.tick().await {
                Ok(true) => {}
                Ok(false) => tokio::time::sleep(self.poll_interval).await,
                Err(err) => {
                    tracing::error!(error = %err, "queue worker tick failed");
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }

    /// Claims and processes at most one job. Returns true when a job was
    /// processed (successfully or not).
    pub async fn tick(&self) -> Result<bool> {
        let Some(job) = self.queue.store().claim_due().await? else {
            return Ok(false);
        };

        tracing::debug!(
            job_id = %job.id,
            order_id = %job.order_id,
            attempt = job.attempts,
            "processing notification job"
        );

        match self.processor.process(&job).await {
            Ok(()) => {
                self.queue.store().mark_completed(job.id).await?;
                metrics::counter!("notification_jobs_completed_total").increment(1);
                tracing::info!(
                    job_id = %job.id,
                    order_id = %job.order_id,
                    "notification job completed"
                );
                self.queue.emit(QueueEvent::Completed {
                    job_id: job.id,
                    order_id: job.order_id,
                });
            }
            Err(err) => self.handle_failure(&job, err).await?,
        }

        Ok(true)
    }

    async fn handle_failure(&self, job: &NotificationJob, err: ProcessError) -> Result<()> {
        if job.exhausted() {
            self.queue.store().mark_dead(job.id, &err.to_string()).await?;
            metrics::counter!("notification_jobs_dead_total").increment(1);
            tracing::error!(
                job_id = %job.id,
                order_id = %job.order_id,
                attempts = job.attempts,
                error = %err,
                "notification job exhausted its attempts and went dead"
            );
            self.queue.emit(QueueEvent::Failed {
                job_id: job.id,
                order_id: job.order_id,
                attempt: job.attempts,
                will_retry: false,
            });
            self.queue.emit(QueueEvent::Dead {
                job_id: job.id,
                order_id: job.order_id,
                attempts: job.attempts,
            });
        } else {
            let run_at = Utc::now() + job.next_backoff();
            self.queue
                .store()
                .mark_retry(job.id, run_at, &err.to_string())
                .await?;
            metrics::counter!("notification_jobs_retried_total").increment(1);
            tracing::warn!(
                job_id = %job.id,
                order_id = %job.order_id,
                attempt = job.attempts,
                retry_at = %run_at,
                error = %err,
                "notification job failed, scheduling retry"
            );
            self.queue.emit(QueueEvent::Failed {
                job_id: job.id,
                order_id: job.order_id,
                attempt: job.attempts,
                will_retry: true,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{EnqueueOptions, JobStatus, NewJob};
    use crate::memory::MemoryJobStore;
    use common::{OrderId, UserId};
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails for the first `failures` invocations, then succeeds.
    struct FlakyProcessor {
        calls: AtomicU32,
        failures: u32,
    }

    impl FlakyProcessor {
        fn failing(failures: u32) -> Self {
            Self {
                calls: AtomicU32::new(0),
                failures,
            }
        }
    }

    #[async_trait]
    impl JobProcessor for FlakyProcessor {
        async fn process(&self, _job: &NotificationJob) -> std::result::Result<(), ProcessError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(format!("simulated failure {call}").into())
            } else {
                Ok(())
            }
        }
    }

    fn fast_options() -> EnqueueOptions {
        EnqueueOptions {
            max_attempts: 3,
            backoff_base: Duration::from_millis(1),
        }
    }

    fn sample_job(order_id: OrderId) -> NewJob {
        NewJob {
            order_id,
            user_id: UserId::new(1),
            kind: "order_created".to_string(),
            message: "order created".to_string(),
        }
    }

    async fn drain_backoff() {
        // Backoff base is 1ms; give retries ample room to become due.
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn successful_job_completes_and_emits() {
        let queue = NotificationQueue::new(MemoryJobStore::new());
        let mut events = queue.subscribe();
        let order_id = OrderId::new();
        let job_id = queue
            .enqueue_with(sample_job(order_id), fast_options())
            .await
            .unwrap();

        let worker = QueueWorker::new(queue.clone(), Arc::new(FlakyProcessor::failing(0)));
        assert!(worker.tick().await.unwrap());

        assert_eq!(
            events.try_recv().unwrap(),
            QueueEvent::Completed { job_id, order_id }
        );
        let job = queue.job(job_id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.attempts, 1);
    }

    #[tokio::test]
    async fn failing_job_is_retried_then_completes() {
        let queue = NotificationQueue::new(MemoryJobStore::new());
        let mut events = queue.subscribe();
        let order_id = OrderId::new();
        let job_id = queue
            .enqueue_with(sample_job(order_id), fast_options())
            .await
            .unwrap();

        let processor = Arc::new(FlakyProcessor::failing(1));
        let worker = QueueWorker::new(queue.clone(), processor.clone());

        assert!(worker.tick().await.unwrap());
        assert_eq!(
            events.try_recv().unwrap(),
            QueueEvent::Failed {
                job_id,
                order_id,
                attempt: 1,
                will_retry: true
            }
        );

        drain_backoff().await;
        assert!(worker.tick().await.unwrap());
        assert_eq!(
            events.try_recv().unwrap(),
            QueueEvent::Completed { job_id, order_id }
        );

        let job = queue.job(job_id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.attempts, 2);
        assert_eq!(processor.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn job_goes_dead_after_max_attempts_and_is_never_retried() {
        let queue = NotificationQueue::new(MemoryJobStore::new());
        let order_id = OrderId::new();
        let job_id = queue
            .enqueue_with(sample_job(order_id), fast_options())
            .await
            .unwrap();

        let processor = Arc::new(FlakyProcessor::failing(u32::MAX));
        let worker = QueueWorker::new(queue.clone(), processor.clone());

        for _ in 0..3 {
            drain_backoff().await;
            assert!(worker.tick().await.unwrap());
        }

        let job = queue.job(job_id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.attempts, 3);
        assert!(job.last_error.is_some());

        // Dead means dead: no further processing.
        drain_backoff().await;
        assert!(!worker.tick().await.unwrap());
        assert_eq!(processor.calls.load(Ordering::SeqCst), 3);

        let dead = queue.dead_jobs().await.unwrap();
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].id, job_id);
    }

    #[tokio::test]
    async fn dead_job_emits_final_failed_and_dead_events() {
        let queue = NotificationQueue::new(MemoryJobStore::new());
        let mut events = queue.subscribe();
        let order_id = OrderId::new();
        let job_id = queue
            .enqueue_with(
                sample_job(order_id),
                EnqueueOptions {
                    max_attempts: 1,
                    backoff_base: Duration::from_millis(1),
                },
            )
            .await
            .unwrap();

        let worker = QueueWorker::new(queue.clone(), Arc::new(FlakyProcessor::failing(u32::MAX)));
        assert!(worker.tick().await.unwrap());

        assert_eq!(
            events.try_recv().unwrap(),
            QueueEvent::Failed {
                job_id,
                order_id,
                attempt: 1,
                will_retry: false
            }
        );
        assert_eq!(
            events.try_recv().unwrap(),
            QueueEvent::Dead {
                job_id,
                order_id,
                attempts: 1
            }
        );
    }

    #[tokio::test]
    async fn worker_processes_orders_independently() {
        let queue = NotificationQueue::new(MemoryJobStore::new());
        queue
            .enqueue_with(sample_job(OrderId::new()), fast_options())
            .await
            .unwrap();
        queue
            .enqueue_with(sample_job(OrderId::new()), fast_options())
            .await
            .unwrap();

        let worker = QueueWorker::new(queue.clone(), Arc::new(FlakyProcessor::failing(0)));
        assert!(worker.tick().await.unwrap());
        assert!(worker.tick().await.unwrap());
        assert!(!worker.tick().await.unwrap());
    }
}
