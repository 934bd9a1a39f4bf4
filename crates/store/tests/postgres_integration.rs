//! PostgreSQL integration tests.
//!
//! These tests share one PostgreSQL container and isolate themselves by
//! truncating tables. Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration -- --test-threads=1
//! ```

use std::str::FromStr;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

use common::{BookingStatus, JobId, MenuItemId, OrderId, OrderStatus, RestaurantId, UserId};
use store::{
    BookingStore, NewBooking, NewNotification, NewOrder, NewOrderItem, NotificationStore,
    OrderStore, PostgresStore, RestaurantDirectory, StoreError,
};

/// Shared container info - container stays alive for all tests
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
            let store = PostgresStore::new(temp_pool.clone());
            store.run_migrations().await.unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query(
        "TRUNCATE TABLE orders, order_items, notifications, notification_jobs, bookings, restaurants",
    )
    .execute(&pool)
    .await
    .unwrap();

    PostgresStore::new(pool)
}

fn sample_order(user: i64, items: usize) -> NewOrder {
    NewOrder {
        user_id: UserId::new(user),
        restaurant_id: RestaurantId::new(1),
        status: OrderStatus::Pending,
        total_amount: BigDecimal::from_str("42.50").unwrap(),
        address: "12 Rue de la Paix".to_string(),
        phone: "555-0001".to_string(),
        notes: Some("ring twice".to_string()),
        items: (0..items)
            .map(|i| NewOrderItem {
                menu_item_id: MenuItemId::new(i as i64 + 7),
                quantity: 2,
                unit_price: BigDecimal::from_str("10.00").unwrap(),
                notes: None,
            })
            .collect(),
    }
}

fn sample_booking(user: i64, restaurant: i64, time: &str) -> NewBooking {
    NewBooking {
        user_id: UserId::new(user),
        restaurant_id: RestaurantId::new(restaurant),
        date: chrono::NaiveDate::from_str("2025-06-01").unwrap(),
        time: time.to_string(),
        number_of_guests: 4,
        special_requests: None,
    }
}

#[tokio::test]
async fn create_and_fetch_order_with_items() {
    let store = get_test_store().await;

    let created = store.create_order(sample_order(3, 2)).await.unwrap();
    assert_eq!(created.items.len(), 2);

    let fetched = store.order(created.order.id).await.unwrap().unwrap();
    assert_eq!(fetched.order.id, created.order.id);
    assert_eq!(fetched.order.user_id, UserId::new(3));
    assert_eq!(fetched.order.status, OrderStatus::Pending);
    assert_eq!(
        fetched.order.total_amount,
        BigDecimal::from_str("42.50").unwrap()
    );
    assert_eq!(fetched.items.len(), 2);
    assert!(fetched.items.iter().all(|i| i.order_id == created.order.id));
    assert_eq!(
        fetched.items[0].unit_price,
        BigDecimal::from_str("10.00").unwrap()
    );
}

#[tokio::test]
async fn missing_order_returns_none() {
    let store = get_test_store().await;
    assert!(store.order(OrderId::new()).await.unwrap().is_none());
}

#[tokio::test]
async fn orders_for_user_newest_first() {
    let store = get_test_store().await;

    let first = store.create_order(sample_order(9, 1)).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = store.create_order(sample_order(9, 1)).await.unwrap();
    store.create_order(sample_order(10, 1)).await.unwrap();

    let orders = store.orders_for_user(UserId::new(9)).await.unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].id, second.order.id);
    assert_eq!(orders[1].id, first.order.id);
}

#[tokio::test]
async fn update_order_status_persists() {
    let store = get_test_store().await;
    let created = store.create_order(sample_order(3, 1)).await.unwrap();

    let updated = store
        .update_order_status(created.order.id, OrderStatus::Confirmed)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.status, OrderStatus::Confirmed);

    let fetched = store.order(created.order.id).await.unwrap().unwrap();
    assert_eq!(fetched.order.status, OrderStatus::Confirmed);

    let missing = store
        .update_order_status(OrderId::new(), OrderStatus::Ready)
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn booking_slot_conflict_is_detected_by_the_index() {
    let store = get_test_store().await;

    store
        .create_booking(sample_booking(1, 5, "19:00"))
        .await
        .unwrap();

    let err = store
        .create_booking(sample_booking(2, 5, "19:00"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::DuplicateSlot));

    // Other slots stay available.
    store
        .create_booking(sample_booking(2, 5, "20:00"))
        .await
        .unwrap();
    store
        .create_booking(sample_booking(2, 6, "19:00"))
        .await
        .unwrap();
}

#[tokio::test]
async fn cancelled_booking_frees_its_slot() {
    let store = get_test_store().await;

    let booking = store
        .create_booking(sample_booking(1, 5, "19:00"))
        .await
        .unwrap();

    // Non-owner cancel misses; the slot stays taken.
    assert!(
        store
            .cancel_booking(booking.id, UserId::new(99))
            .await
            .unwrap()
            .is_none()
    );

    let cancelled = store
        .cancel_booking(booking.id, UserId::new(1))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);

    store
        .create_booking(sample_booking(2, 5, "19:00"))
        .await
        .unwrap();
}

#[tokio::test]
async fn notification_inserts_and_lists_newest_first() {
    let store = get_test_store().await;
    let order_id = OrderId::new();

    store
        .insert_notification(NewNotification {
            order_id,
            job_id: None,
            kind: "order_created".to_string(),
            message: "order created".to_string(),
        })
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    store
        .insert_notification(NewNotification {
            order_id,
            job_id: None,
            kind: "order_confirmed".to_string(),
            message: "order confirmed".to_string(),
        })
        .await
        .unwrap();

    let listed = store.notifications_for_order(order_id).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].kind, "order_confirmed");
    assert_eq!(listed[1].kind, "order_created");
}

#[tokio::test]
async fn unique_notification_insert_dedupes_on_job_id() {
    let store = get_test_store().await;
    let order_id = OrderId::new();
    let job_id = JobId::new();

    let new = NewNotification {
        order_id,
        job_id: Some(job_id),
        kind: "order_ready".to_string(),
        message: "order ready".to_string(),
    };

    let first = store
        .insert_notification_unique(new.clone())
        .await
        .unwrap();
    let second = store.insert_notification_unique(new).await.unwrap();
    assert_eq!(first.id, second.id);

    let listed = store.notifications_for_order(order_id).await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn restaurant_existence_lookup() {
    let store = get_test_store().await;

    sqlx::query("INSERT INTO restaurants (id, name) VALUES (5, 'Chez Panisse')")
        .execute(store.pool())
        .await
        .unwrap();

    assert!(
        store
            .restaurant_exists(RestaurantId::new(5))
            .await
            .unwrap()
    );
    assert!(
        !store
            .restaurant_exists(RestaurantId::new(6))
            .await
            .unwrap()
    );
}
