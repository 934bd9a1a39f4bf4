//! Persistence gateway for the ordering system.
//!
//! Defines the storage traits ([`OrderStore`], [`NotificationStore`],
//! [`BookingStore`], [`RestaurantDirectory`]) together with a
//! PostgreSQL implementation and an in-memory implementation used for
//! tests and DB-less development. Order creation is a single
//! transaction: the order row and all of its item rows commit or roll
//! back together.

mod error;
mod memory;
mod postgres;
mod records;
mod store;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use records::{
    Booking, NewBooking, NewNotification, NewOrder, NewOrderItem, Notification, Order, OrderItem,
    OrderWithItems,
};
pub use store::{BookingStore, NotificationStore, OrderStore, RestaurantDirectory, Store};
