//! Storage traits implemented by the PostgreSQL and in-memory backends.

use async_trait::async_trait;

use common::{BookingId, OrderId, OrderStatus, RestaurantId, UserId};

use crate::records::{
    Booking, NewBooking, NewNotification, NewOrder, Notification, Order, OrderWithItems,
};
use crate::Result;

/// Transactional read/write access to orders and their line items.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts one order row and all of its item rows atomically.
    ///
    /// Either the order and every item become visible together, or
    /// nothing does.
    async fn create_order(&self, new: NewOrder) -> Result<OrderWithItems>;

    /// Fetches one order with its items.
    async fn order(&self, id: OrderId) -> Result<Option<OrderWithItems>>;

    /// All orders placed by a user, newest first.
    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>>;

    /// All orders against a restaurant, newest first.
    async fn orders_for_restaurant(&self, restaurant_id: RestaurantId) -> Result<Vec<Order>>;

    /// Sets the order status and bumps `updated_at`.
    ///
    /// Returns `None` when no order with that id exists.
    async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Option<Order>>;
}

/// Append-only notification records.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Inserts a notification row unconditionally.
    async fn insert_notification(&self, new: NewNotification) -> Result<Notification>;

    /// Inserts a notification row unless one already exists for the same
    /// job id, in which case the existing row is returned. `new.job_id`
    /// must be set.
    async fn insert_notification_unique(&self, new: NewNotification) -> Result<Notification>;

    /// All notifications for an order, newest first.
    async fn notifications_for_order(&self, order_id: OrderId) -> Result<Vec<Notification>>;
}

/// Booking persistence with atomic slot exclusivity.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Inserts a `pending` booking, failing with
    /// [`StoreError::DuplicateSlot`](crate::StoreError::DuplicateSlot)
    /// when a non-cancelled booking already occupies the slot. The check
    /// and the insert are one atomic operation.
    async fn create_booking(&self, new: NewBooking) -> Result<Booking>;

    /// Cancels a booking owned by `user_id`.
    ///
    /// Returns `None` when no booking matches both the id and the owner,
    /// deliberately indistinguishable from a missing booking.
    async fn cancel_booking(&self, id: BookingId, user_id: UserId) -> Result<Option<Booking>>;

    /// All bookings made by a user, newest date/time first.
    async fn bookings_for_user(&self, user_id: UserId) -> Result<Vec<Booking>>;
}

/// Existence lookup for restaurants, owned by the restaurants service.
#[async_trait]
pub trait RestaurantDirectory: Send + Sync {
    /// True when a restaurant with this id exists.
    async fn restaurant_exists(&self, id: RestaurantId) -> Result<bool>;
}

/// Convenience super-trait for backends implementing the full gateway.
pub trait Store: OrderStore + NotificationStore + BookingStore + RestaurantDirectory {}

impl<T> Store for T where T: OrderStore + NotificationStore + BookingStore + RestaurantDirectory {}
