//! PostgreSQL job store integration tests.
//!
//! These tests share one PostgreSQL container. Run with:
//!
//! ```bash
//! cargo test -p queue --test postgres_queue -- --test-threads=1
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

use common::{OrderId, UserId};
use queue::{EnqueueOptions, JobStatus, JobStore, NewJob, PostgresJobStore};

struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            sqlx::raw_sql(include_str!(
                "../../../migrations/003_create_notification_jobs.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

async fn get_test_store() -> PostgresJobStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE notification_jobs")
        .execute(&pool)
        .await
        .unwrap();

    PostgresJobStore::new(pool)
}

fn sample_job(order_id: OrderId, kind: &str) -> NewJob {
    NewJob {
        order_id,
        user_id: UserId::new(1),
        kind: kind.to_string(),
        message: format!("{kind} message"),
    }
}

#[tokio::test]
async fn enqueue_and_claim_roundtrip() {
    let store = get_test_store().await;
    let order_id = OrderId::new();

    let enqueued = store
        .enqueue(sample_job(order_id, "order_created"), &Default::default())
        .await
        .unwrap();
    assert_eq!(enqueued.status, JobStatus::Pending);
    assert_eq!(enqueued.attempts, 0);
    assert_eq!(enqueued.max_attempts, 3);
    assert_eq!(enqueued.backoff_base_ms, 1000);

    let claimed = store.claim_due().await.unwrap().unwrap();
    assert_eq!(claimed.id, enqueued.id);
    assert_eq!(claimed.status, JobStatus::Active);
    assert_eq!(claimed.attempts, 1);

    // Claimed means exclusively held.
    assert!(store.claim_due().await.unwrap().is_none());
}

#[tokio::test]
async fn per_order_fifo_is_enforced() {
    let store = get_test_store().await;
    let order_id = OrderId::new();

    let first = store
        .enqueue(sample_job(order_id, "order_created"), &Default::default())
        .await
        .unwrap();
    let second = store
        .enqueue(sample_job(order_id, "order_confirmed"), &Default::default())
        .await
        .unwrap();

    let claimed = store.claim_due().await.unwrap().unwrap();
    assert_eq!(claimed.id, first.id);
    assert!(store.claim_due().await.unwrap().is_none());

    store.mark_completed(first.id).await.unwrap();
    let claimed = store.claim_due().await.unwrap().unwrap();
    assert_eq!(claimed.id, second.id);
}

#[tokio::test]
async fn retry_scheduling_respects_run_at() {
    let store = get_test_store().await;
    let job = store
        .enqueue(
            sample_job(OrderId::new(), "order_created"),
            &EnqueueOptions {
                max_attempts: 3,
                backoff_base: Duration::from_millis(1),
            },
        )
        .await
        .unwrap();

    store.claim_due().await.unwrap().unwrap();
    store
        .mark_retry(job.id, Utc::now() + chrono::Duration::hours(1), "boom")
        .await
        .unwrap();

    assert!(store.claim_due().await.unwrap().is_none());

    store
        .mark_retry(job.id, Utc::now() - chrono::Duration::seconds(1), "boom")
        .await
        .unwrap();
    let reclaimed = store.claim_due().await.unwrap().unwrap();
    assert_eq!(reclaimed.id, job.id);
    assert_eq!(reclaimed.attempts, 2);
    assert_eq!(reclaimed.last_error.as_deref(), Some("boom"));
}

#[tokio::test]
async fn dead_jobs_are_terminal_and_listed() {
    let store = get_test_store().await;
    let job = store
        .enqueue(sample_job(OrderId::new(), "order_created"), &Default::default())
        .await
        .unwrap();

    store.claim_due().await.unwrap().unwrap();
    store.mark_dead(job.id, "gave up").await.unwrap();

    assert!(store.claim_due().await.unwrap().is_none());

    let dead = store.dead_jobs().await.unwrap();
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].id, job.id);
    assert_eq!(dead[0].status, JobStatus::Failed);
    assert_eq!(dead[0].last_error.as_deref(), Some("gave up"));
}
