//! PostgreSQL implementation of the persistence gateway.

use std::str::FromStr;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use common::{
    BookingId, BookingStatus, JobId, MenuItemId, NotificationId, OrderId, OrderStatus,
    RestaurantId, UserId,
};

use crate::records::{
    Booking, NewBooking, NewNotification, NewOrder, Notification, Order, OrderItem,
    OrderWithItems,
};
use crate::store::{BookingStore, NotificationStore, OrderStore, RestaurantDirectory};
use crate::{Result, StoreError};

/// PostgreSQL-backed persistence gateway.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the database and creates a store.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_order(row: &PgRow) -> Result<Order> {
        let status: String = row.try_get("status")?;
        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user_id: UserId::new(row.try_get("user_id")?),
            restaurant_id: RestaurantId::new(row.try_get("restaurant_id")?),
            status: OrderStatus::from_str(&status)
                .map_err(|e| StoreError::Decode(e.to_string()))?,
            total_amount: row.try_get::<BigDecimal, _>("total_amount")?,
            address: row.try_get("address")?,
            phone: row.try_get("phone")?,
            notes: row.try_get("notes")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
        })
    }

    fn row_to_item(row: &PgRow) -> Result<OrderItem> {
        Ok(OrderItem {
            id: row.try_get::<Uuid, _>("id")?,
            order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
            menu_item_id: MenuItemId::new(row.try_get("menu_item_id")?),
            quantity: row.try_get("quantity")?,
            unit_price: row.try_get::<BigDecimal, _>("unit_price")?,
            notes: row.try_get("notes")?,
        })
    }

    fn row_to_notification(row: &PgRow) -> Result<Notification> {
        Ok(Notification {
            id: NotificationId::from_uuid(row.try_get::<Uuid, _>("id")?),
            order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
            job_id: row
                .try_get::<Option<Uuid>, _>("job_id")?
                .map(JobId::from_uuid),
            kind: row.try_get("type")?,
            message: row.try_get("message")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        })
    }

    fn row_to_booking(row: &PgRow) -> Result<Booking> {
        let status: String = row.try_get("status")?;
        Ok(Booking {
            id: BookingId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user_id: UserId::new(row.try_get("user_id")?),
            restaurant_id: RestaurantId::new(row.try_get("restaurant_id")?),
            date: row.try_get::<NaiveDate, _>("date")?,
            time: row.try_get("time")?,
            number_of_guests: row.try_get("number_of_guests")?,
            special_requests: row.try_get("special_requests")?,
            status: BookingStatus::from_str(&status)
                .map_err(|e| StoreError::Decode(e.to_string()))?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        })
    }

    async fn items_for_order(&self, order_id: OrderId) -> Result<Vec<OrderItem>> {
        let rows = sqlx::query(
            r#"
            SELECT id, order_id, menu_item_id, quantity, unit_price, notes
            FROM order_items
            WHERE order_id = $1
            ORDER BY id
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_item).collect()
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn create_order(&self, new: NewOrder) -> Result<OrderWithItems> {
        let now = Utc::now();
        let order_id = OrderId::new();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, restaurant_id, status, total_amount,
                                address, phone, notes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(new.user_id.as_i64())
        .bind(new.restaurant_id.as_i64())
        .bind(new.status.as_str())
        .bind(&new.total_amount)
        .bind(&new.address)
        .bind(&new.phone)
        .bind(&new.notes)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(new.items.len());
        for item in &new.items {
            let item_id = Uuid::new_v4();
            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, menu_item_id, quantity, unit_price, notes)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(item_id)
            .bind(order_id.as_uuid())
            .bind(item.menu_item_id.as_i64())
            .bind(item.quantity)
            .bind(&item.unit_price)
            .bind(&item.notes)
            .execute(&mut *tx)
            .await?;

            items.push(OrderItem {
                id: item_id,
                order_id,
                menu_item_id: item.menu_item_id,
                quantity: item.quantity,
                unit_price: item.unit_price.clone(),
                notes: item.notes.clone(),
            });
        }

        tx.commit().await?;

        Ok(OrderWithItems {
            order: Order {
                id: order_id,
                user_id: new.user_id,
                restaurant_id: new.restaurant_id,
                status: new.status,
                total_amount: new.total_amount,
                address: new.address,
                phone: new.phone,
                notes: new.notes,
                created_at: now,
                updated_at: now,
            },
            items,
        })
    }

    async fn order(&self, id: OrderId) -> Result<Option<OrderWithItems>> {
        let row = sqlx::query("SELECT * FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let order = Self::row_to_order(&row)?;
                let items = self.items_for_order(id).await?;
                Ok(Some(OrderWithItems { order, items }))
            }
            None => Ok(None),
        }
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let rows =
            sqlx::query("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC")
                .bind(user_id.as_i64())
                .fetch_all(&self.pool)
                .await?;

        rows.iter().map(Self::row_to_order).collect()
    }

    async fn orders_for_restaurant(&self, restaurant_id: RestaurantId) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            "SELECT * FROM orders WHERE restaurant_id = $1 ORDER BY created_at DESC",
        )
        .bind(restaurant_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_order).collect()
    }

    async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Option<Order>> {
        let row = sqlx::query(
            r#"
            UPDATE orders
            SET status = $1, updated_at = $2
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(status.as_str())
        .bind(Utc::now())
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| Self::row_to_order(&r)).transpose()
    }
}

#[async_trait]
impl NotificationStore for PostgresStore {
    async fn insert_notification(&self, new: NewNotification) -> Result<Notification> {
        let now = Utc::now();
        let id = NotificationId::new();

        sqlx::query(
            r#"
            INSERT INTO notifications (id, order_id, job_id, type, message, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id.as_uuid())
        .bind(new.order_id.as_uuid())
        .bind(new.job_id.map(|j| j.as_uuid()))
        .bind(&new.kind)
        .bind(&new.message)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Notification {
            id,
            order_id: new.order_id,
            job_id: new.job_id,
            kind: new.kind,
            message: new.message,
            created_at: now,
        })
    }

    async fn insert_notification_unique(&self, new: NewNotification) -> Result<Notification> {
        let Some(job_id) = new.job_id else {
            return self.insert_notification(new).await;
        };

        let inserted = sqlx::query(
            r#"
            INSERT INTO notifications (id, order_id, job_id, type, message, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (job_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(NotificationId::new().as_uuid())
        .bind(new.order_id.as_uuid())
        .bind(job_id.as_uuid())
        .bind(&new.kind)
        .bind(&new.message)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = inserted {
            return Self::row_to_notification(&row);
        }

        // Lost the race (or a retry): return the row that won.
        let row = sqlx::query("SELECT * FROM notifications WHERE job_id = $1")
            .bind(job_id.as_uuid())
            .fetch_one(&self.pool)
            .await?;
        Self::row_to_notification(&row)
    }

    async fn notifications_for_order(&self, order_id: OrderId) -> Result<Vec<Notification>> {
        let rows = sqlx::query(
            "SELECT * FROM notifications WHERE order_id = $1 ORDER BY created_at DESC",
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_notification).collect()
    }
}

#[async_trait]
impl BookingStore for PostgresStore {
    async fn create_booking(&self, new: NewBooking) -> Result<Booking> {
        let now = Utc::now();
        let id = BookingId::new();

        sqlx::query(
            r#"
            INSERT INTO bookings (id, user_id, restaurant_id, date, time,
                                  number_of_guests, special_requests, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending', $8)
            "#,
        )
        .bind(id.as_uuid())
        .bind(new.user_id.as_i64())
        .bind(new.restaurant_id.as_i64())
        .bind(new.date)
        .bind(&new.time)
        .bind(new.number_of_guests)
        .bind(&new.special_requests)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            // The partial unique index turns a lost slot race into a
            // constraint violation instead of a duplicate booking.
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("uniq_bookings_active_slot")
            {
                return StoreError::DuplicateSlot;
            }
            StoreError::Database(e)
        })?;

        Ok(Booking {
            id,
            user_id: new.user_id,
            restaurant_id: new.restaurant_id,
            date: new.date,
            time: new.time,
            number_of_guests: new.number_of_guests,
            special_requests: new.special_requests,
            status: BookingStatus::Pending,
            created_at: now,
        })
    }

    async fn cancel_booking(&self, id: BookingId, user_id: UserId) -> Result<Option<Booking>> {
        let row = sqlx::query(
            r#"
            UPDATE bookings
            SET status = 'cancelled'
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id.as_uuid())
        .bind(user_id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| Self::row_to_booking(&r)).transpose()
    }

    async fn bookings_for_user(&self, user_id: UserId) -> Result<Vec<Booking>> {
        let rows = sqlx::query(
            "SELECT * FROM bookings WHERE user_id = $1 ORDER BY date DESC, time DESC",
        )
        .bind(user_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_booking).collect()
    }
}

#[async_trait]
impl RestaurantDirectory for PostgresStore {
    async fn restaurant_exists(&self, id: RestaurantId) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM restaurants WHERE id = $1)")
                .bind(id.as_i64())
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }
}
