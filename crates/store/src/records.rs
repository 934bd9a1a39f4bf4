//! Persisted record types and their insert payloads.

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use common::{
    BookingId, BookingStatus, JobId, MenuItemId, NotificationId, OrderId, OrderStatus,
    RestaurantId, UserId,
};

/// A user's purchase request against one restaurant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub restaurant_id: RestaurantId,
    pub status: OrderStatus,
    pub total_amount: BigDecimal,
    pub address: String,
    pub phone: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line item exclusively owned by one order. `unit_price` is the menu
/// price at creation time; it is never re-read from the menu item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: OrderId,
    pub menu_item_id: MenuItemId,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub notes: Option<String>,
}

/// An order together with its line items, as created and as read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Payload for the transactional order insert.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub restaurant_id: RestaurantId,
    pub status: OrderStatus,
    pub total_amount: BigDecimal,
    pub address: String,
    pub phone: String,
    pub notes: Option<String>,
    pub items: Vec<NewOrderItem>,
}

/// One line item of a [`NewOrder`].
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub menu_item_id: MenuItemId,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub notes: Option<String>,
}

/// Durable record of a delivered (or at least persisted) notification.
/// Append-only; queried by order, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub order_id: OrderId,
    pub job_id: Option<JobId>,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Payload for a notification insert.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub order_id: OrderId,
    pub job_id: Option<JobId>,
    pub kind: String,
    pub message: String,
}

/// A table reservation. At most one non-cancelled booking may hold a
/// given (restaurant, date, time) slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub user_id: UserId,
    pub restaurant_id: RestaurantId,
    pub date: NaiveDate,
    pub time: String,
    pub number_of_guests: i32,
    pub special_requests: Option<String>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

/// Payload for a booking insert. Status always starts out `pending`.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub user_id: UserId,
    pub restaurant_id: RestaurantId,
    pub date: NaiveDate,
    pub time: String,
    pub number_of_guests: i32,
    pub special_requests: Option<String>,
}
