//! Shared vocabulary for the ordering system.
//!
//! Typed identifiers, the authenticated principal handed over by the
//! upstream gateway, and the order/booking status enums used by every
//! other crate in the workspace.

mod ids;
mod principal;
mod status;

pub use ids::{BookingId, JobId, MenuItemId, NotificationId, OrderId, RestaurantId, UserId};
pub use principal::{Principal, Role, STAFF_ROLES, UnknownRole};
pub use status::{BookingStatus, OrderStatus, ParseStatusError};
