//! PostgreSQL-backed job store.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use common::{JobId, OrderId, UserId};

use crate::job::{EnqueueOptions, JobStatus, NewJob, NotificationJob};
use crate::store::JobStore;
use crate::{QueueError, Result};

/// PostgreSQL implementation of [`JobStore`].
///
/// Claiming uses `FOR UPDATE SKIP LOCKED`, so any number of workers can
/// poll the same table without handing one job to two of them.
#[derive(Clone)]
pub struct PostgresJobStore {
    pool: PgPool,
}

impl PostgresJobStore {
    /// Creates a job store over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_job(row: &PgRow) -> Result<NotificationJob> {
        let status: String = row.try_get("status")?;
        Ok(NotificationJob {
            id: JobId::from_uuid(row.try_get::<Uuid, _>("id")?),
            order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
            user_id: UserId::new(row.try_get("user_id")?),
            kind: row.try_get("type")?,
            message: row.try_get("message")?,
            status: JobStatus::from_str(&status).map_err(QueueError::Decode)?,
            attempts: row.try_get("attempts")?,
            max_attempts: row.try_get("max_attempts")?,
            backoff_base_ms: row.try_get("backoff_base_ms")?,
            run_at: row.try_get::<DateTime<Utc>, _>("run_at")?,
            last_error: row.try_get("last_error")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
        })
    }
}

#[async_trait]
impl JobStore for PostgresJobStore {
    async fn enqueue(&self, new: NewJob, options: &EnqueueOptions) -> Result<NotificationJob> {
        let now = Utc::now();
        let id = JobId::new();

        sqlx::query(
            r#"
            INSERT INTO notification_jobs
                (id, order_id, user_id, type, message, status, attempts,
                 max_attempts, backoff_base_ms, run_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, 'pending', 0, $6, $7, $8, $8, $8)
            "#,
        )
        .bind(id.as_uuid())
        .bind(new.order_id.as_uuid())
        .bind(new.user_id.as_i64())
        .bind(&new.kind)
        .bind(&new.message)
        .bind(options.max_attempts)
        .bind(options.backoff_base.as_millis() as i64)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(NotificationJob {
            id,
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
        })
    }

    async fn claim_due(&self) -> Result<Option<NotificationJob>> {
        // One statement keeps select-and-mark atomic. The NOT EXISTS
        // clause enforces per-order FIFO: an active job, or an earlier
        // pending one (even when it is waiting out a backoff), blocks
        // everything younger for the same order.
        let row = sqlx::query(
            r#"
            UPDATE notification_jobs
            SET status = 'active', attempts = attempts + 1, updated_at = NOW()
            WHERE id = (
                SELECT j.id
                FROM notification_jobs j
                WHERE j.status = 'pending'
                  AND j.run_at <= NOW()
                  AND NOT EXISTS (
                      SELECT 1
                      FROM notification_jobs e
                      WHERE e.order_id = j.order_id
                        AND e.id <> j.id
                        AND (e.status = 'active'
                             OR (e.status = 'pending'
                                 AND (e.created_at, e.id) < (j.created_at, j.id)))
                  )
                ORDER BY j.created_at, j.id
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING *
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| Self::row_to_job(&r)).transpose()
    }

    async fn mark_completed(&self, id: JobId) -> Result<()> {
        let result = sqlx::query(
            "UPDATE notification_jobs SET status = 'completed', updated_at = NOW() WHERE id = $1",
        )
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(QueueError::JobNotFound(id));
        }
        Ok(())
    }

    async fn mark_retry(&self, id: JobId, run_at: DateTime<Utc>, error: &str) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE notification_jobs
            SET status = 'pending', run_at = $1, last_error = $2, updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(run_at)
        .bind(error)
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(QueueError::JobNotFound(id));
        }
        Ok(())
    }

    async fn mark_dead(&self, id: JobId, error: &str) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE notification_jobs
            SET status = 'failed', last_error = $1, updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(error)
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(QueueError::JobNotFound(id));
        }
        Ok(())
    }

    async fn job(&self, id: JobId) -> Result<Option<NotificationJob>> {
        let row = sqlx::query("SELECT * FROM notification_jobs WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| Self::row_to_job(&r)).transpose()
    }

    async fn dead_jobs(&self) -> Result<Vec<NotificationJob>> {
        let rows = sqlx::query(
            "SELECT * FROM notification_jobs WHERE status = 'failed' ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_job).collect()
    }
}
