//! In-memory store implementation for testing and DB-less development.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use common::{
    BookingId, BookingStatus, NotificationId, OrderId, OrderStatus, RestaurantId, UserId,
};

use crate::records::{
    Booking, NewBooking, NewNotification, NewOrder, Notification, Order, OrderItem,
    OrderWithItems,
};
use crate::store::{BookingStore, NotificationStore, OrderStore, RestaurantDirectory};
use crate::{Result, StoreError};

#[derive(Default)]
struct Inner {
    orders: Vec<Order>,
    items: HashMap<OrderId, Vec<OrderItem>>,
    notifications: Vec<Notification>,
    bookings: Vec<Booking>,
    restaurants: HashSet<RestaurantId>,
}

/// In-memory implementation of the full persistence gateway.
///
/// Provides the same interface and semantics as the PostgreSQL
/// implementation; a single lock stands in for transactions, so the
/// check-and-insert of bookings is as atomic as the partial unique
/// index is in Postgres.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a restaurant id for the existence lookup.
    pub async fn add_restaurant(&self, id: RestaurantId) {
        self.inner.write().await.restaurants.insert(id);
    }

    /// Returns the total number of order rows stored.
    pub async fn order_count(&self) -> usize {
        self.inner.read().await.orders.len()
    }

    /// Returns the total number of order item rows stored.
    pub async fn order_item_count(&self) -> usize {
        self.inner.read().await.items.values().map(Vec::len).sum()
    }

    /// Returns the total number of notification rows stored.
    pub async fn notification_count(&self) -> usize {
        self.inner.read().await.notifications.len()
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn create_order(&self, new: NewOrder) -> Result<OrderWithItems> {
        let now = Utc::now();
        let order = Order {
            id: OrderId::new(),
            user_id: new.user_id,
            restaurant_id: new.restaurant_id,
            status: new.status,
            total_amount: new.total_amount,
            address: new.address,
            phone: new.phone,
            notes: new.notes,
            created_at: now,
            updated_at: now,
        };
        let items: Vec<OrderItem> = new
            .items
            .into_iter()
            .map(|item| OrderItem {
                id: Uuid::new_v4(),
                order_id: order.id,
                menu_item_id: item.menu_item_id,
                quantity: item.quantity,
                unit_price: item.unit_price,
                notes: item.notes,
            })
            .collect();

        let mut inner = self.inner.write().await;
        inner.orders.push(order.clone());
        inner.items.insert(order.id, items.clone());
        Ok(OrderWithItems { order, items })
    }

    async fn order(&self, id: OrderId) -> Result<Option<OrderWithItems>> {
        let inner = self.inner.read().await;
        Ok(inner.orders.iter().find(|o| o.id == id).map(|order| {
            OrderWithItems {
                order: order.clone(),
                items: inner.items.get(&id).cloned().unwrap_or_default(),
            }
        }))
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let inner = self.inner.read().await;
        Ok(inner
            .orders
            .iter()
            .rev()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn orders_for_restaurant(&self, restaurant_id: RestaurantId) -> Result<Vec<Order>> {
        let inner = self.inner.read().await;
        Ok(inner
            .orders
            .iter()
            .rev()
            .filter(|o| o.restaurant_id == restaurant_id)
            .cloned()
            .collect())
    }

    async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Option<Order>> {
        let mut inner = self.inner.write().await;
        match inner.orders.iter_mut().find(|o| o.id == id) {
            Some(order) => {
                order.status = status;
                order.updated_at = Utc::now();
                Ok(Some(order.clone()))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn insert_notification(&self, new: NewNotification) -> Result<Notification> {
        let notification = Notification {
            id: NotificationId::new(),
            order_id: new.order_id,
            job_id: new.job_id,
            kind: new.kind,
            message: new.message,
            created_at: Utc::now(),
        };
        self.inner
            .write()
            .await
            .notifications
            .push(notification.clone());
        Ok(notification)
    }

    async fn insert_notification_unique(&self, new: NewNotification) -> Result<Notification> {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner
            .notifications
            .iter()
            .find(|n| n.job_id.is_some() && n.job_id == new.job_id)
        {
            return Ok(existing.clone());
        }
        let notification = Notification {
            id: NotificationId::new(),
            order_id: new.order_id,
            job_id: new.job_id,
            kind: new.kind,
            message: new.message,
            created_at: Utc::now(),
        };
        inner.notifications.push(notification.clone());
        Ok(notification)
    }

    async fn notifications_for_order(&self, order_id: OrderId) -> Result<Vec<Notification>> {
        let inner = self.inner.read().await;
        Ok(inner
            .notifications
            .iter()
            .rev()
            .filter(|n| n.order_id == order_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn create_booking(&self, new: NewBooking) -> Result<Booking> {
        let mut inner = self.inner.write().await;
        let occupied = inner.bookings.iter().any(|b| {
            b.restaurant_id == new.restaurant_id
                && b.date == new.date
                && b.time == new.time
                && b.status != BookingStatus::Cancelled
        });
        if occupied {
            return Err(StoreError::DuplicateSlot);
        }

        let booking = Booking {
            id: BookingId::new(),
            user_id: new.user_id,
            restaurant_id: new.restaurant_id,
            date: new.date,
            time: new.time,
            number_of_guests: new.number_of_guests,
            special_requests: new.special_requests,
            status: BookingStatus::Pending,
            created_at: Utc::now(),
        };
        inner.bookings.push(booking.clone());
        Ok(booking)
    }

    async fn cancel_booking(&self, id: BookingId, user_id: UserId) -> Result<Option<Booking>> {
        let mut inner = self.inner.write().await;
        match inner
            .bookings
            .iter_mut()
            .find(|b| b.id == id && b.user_id == user_id)
        {
            Some(booking) => {
                booking.status = BookingStatus::Cancelled;
                Ok(Some(booking.clone()))
            }
            None => Ok(None),
        }
    }

    async fn bookings_for_user(&self, user_id: UserId) -> Result<Vec<Booking>> {
        let inner = self.inner.read().await;
        let mut bookings: Vec<Booking> = inner
            .bookings
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.date.cmp(&a.date).then(b.time.cmp(&a.time)));
        Ok(bookings)
    }
}

#[async_trait]
impl RestaurantDirectory for MemoryStore {
    async fn restaurant_exists(&self, id: RestaurantId) -> Result<bool> {
        Ok(self.inner.read().await.restaurants.contains(&id))
    }
}
