//! Authenticated principal and role-based authorization.
//!
//! Authentication itself happens upstream (the gateway validates the JWT
//! and forwards the resolved identity); this service only consumes the
//! result. Authorization is one reusable capability check instead of
//! role-string comparisons scattered across handlers.

use serde::{Deserialize, Serialize};

use crate::UserId;

/// Role attached to a principal by the users service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Admin,
    RestaurantManager,
}

/// Roles allowed to manage orders on behalf of a restaurant.
pub const STAFF_ROLES: [Role; 2] = [Role::Admin, Role::RestaurantManager];

impl Role {
    /// Returns true if this role is one of the required roles.
    pub fn permits(&self, required: &[Role]) -> bool {
        required.contains(self)
    }

    /// Returns the wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Admin => "admin",
            Role::RestaurantManager => "restaurant_manager",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "admin" => Ok(Role::Admin),
            "restaurant_manager" => Ok(Role::RestaurantManager),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Error returned when a role string is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl std::fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown role: {}", self.0)
    }
}

impl std::error::Error for UnknownRole {}

/// The authenticated caller of a request, resolved by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    pub role: Role,
}

impl Principal {
    /// Creates a principal.
    pub fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    /// True when the principal may act on restaurant orders.
    pub fn is_staff(&self) -> bool {
        self.role.permits(&STAFF_ROLES)
    }
}
