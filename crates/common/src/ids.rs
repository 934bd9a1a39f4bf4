//! Typed identifiers.
//!
//! Entities owned by this service (orders, bookings, notifications, queue
//! jobs) use UUIDs generated here. Users, restaurants and menu items are
//! owned by the external users/restaurants services, which hand out
//! integer ids — those are wrapped as i64 newtypes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random id.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

macro_rules! int_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw integer id.
            pub fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the underlying integer.
            pub fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for an order.
    OrderId
);
uuid_id!(
    /// Unique identifier for a table booking.
    BookingId
);
uuid_id!(
    /// Unique identifier for a persisted notification.
    NotificationId
);
uuid_id!(
    /// Unique identifier for a queued notification job.
    JobId
);

int_id!(
    /// Identifier of a user in the users service.
    UserId
);
int_id!(
    /// Identifier of a restaurant in the restaurants service.
    RestaurantId
);
int_id!(
    /// Identifier of a menu item in the restaurants service.
    MenuItemId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_ids_are_unique() {
        assert_ne!(OrderId::new(), OrderId::new());
        assert_ne!(JobId::new(), JobId::new());
    }

    #[test]
    fn uuid_id_roundtrips_through_uuid() {
        let uuid = Uuid::new_v4();
        let id = OrderId::from_uuid(uuid);
        assert_eq!(id.as_uuid(), uuid);
        assert_eq!(Uuid::from(id), uuid);
    }

    #[test]
    fn int_id_roundtrips() {
        let id = UserId::new(42);
        assert_eq!(id.as_i64(), 42);
        assert_eq!(i64::from(id), 42);
        assert_eq!(UserId::from(42), id);
    }

    #[test]
    fn ids_serialize_transparently() {
        let user = UserId::new(7);
        assert_eq!(serde_json::to_string(&user).unwrap(), "7");

        let order = OrderId::new();
        let json = serde_json::to_string(&order).unwrap();
        assert_eq!(json, format!("\"{order}\""));
    }

    #[test]
    fn ids_display_their_raw_value() {
        assert_eq!(UserId::new(9).to_string(), "9");
        let order = OrderId::new();
        assert_eq!(order.to_string(), order.as_uuid().to_string());
    }
}
