//! Order status transition policies.

use common::OrderStatus;

/// Decides whether an order may move from one status to another.
///
/// The policy is injected into
/// [`OrderService`](crate::OrderService), so deployments can tighten the
/// lifecycle without touching the service.
pub type TransitionPolicy = fn(OrderStatus, OrderStatus) -> bool;

/// Permits every transition. This is the default.
pub fn allow_any(_from: OrderStatus, _to: OrderStatus) -> bool {
    true
}

/// The forward-only kitchen flow: pending → confirmed → preparing →
/// ready → delivered, with cancellation allowed until the order is ready.
pub fn strict_flow(from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;
    matches!(
        (from, to),
        (Pending, Confirmed)
            | (Pending, Cancelled)
            | (Confirmed, Preparing)
            | (Confirmed, Cancelled)
            | (Preparing, Ready)
            | (Preparing, Cancelled)
            | (Ready, Delivered)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::OrderStatus::*;

    #[test]
    fn allow_any_permits_everything() {
        for from in [Pending, Confirmed, Preparing, Ready, Delivered, Cancelled] {
            for to in [Pending, Confirmed, Preparing, Ready, Delivered, Cancelled] {
                assert!(allow_any(from, to));
            }
        }
    }

    #[test]
    fn strict_flow_follows_the_kitchen_pipeline() {
        assert!(strict_flow(Pending, Confirmed));
        assert!(strict_flow(Confirmed, Preparing));
        assert!(strict_flow(Preparing, Ready));
        assert!(strict_flow(Ready, Delivered));
    }

    #[test]
    fn strict_flow_allows_cancellation_until_ready() {
        assert!(strict_flow(Pending, Cancelled));
        assert!(strict_flow(Confirmed, Cancelled));
        assert!(strict_flow(Preparing, Cancelled));
        assert!(!strict_flow(Ready, Cancelled));
        assert!(!strict_flow(Delivered, Cancelled));
    }

    #[test]
    fn strict_flow_rejects_skips_and_reversals() {
        assert!(!strict_flow(Pending, Ready));
        assert!(!strict_flow(Confirmed, Delivered));
        assert!(!strict_flow(Ready, Preparing));
        assert!(!strict_flow(Delivered, Pending));
        assert!(!strict_flow(Cancelled, Confirmed));
    }
}
