//! Business services over the storage gateway and the notification queue.
//!
//! [`OrderService`] owns the order lifecycle: transactional creation of an
//! order with its items, status transitions, and the notification jobs
//! both of those enqueue. [`BookingService`] owns table reservations with
//! atomic slot exclusivity. [`NotificationProcessor`] is the queue-side
//! consumer that turns claimed jobs into durable notification rows.

mod bookings;
mod error;
mod notifications;
mod orders;
mod transitions;

pub use bookings::{BookingService, CreateBooking};
pub use error::{DomainError, Result};
pub use notifications::{
    AppendWriter, DeliveryDelays, IdempotentWriter, NotificationProcessor, NotificationWriter,
};
pub use orders::{CreateOrder, CreateOrderItem, OrderService};
pub use transitions::{TransitionPolicy, allow_any, strict_flow};
