//! Order lifecycle service.

use std::str::FromStr;
use std::sync::Arc;

use bigdecimal::BigDecimal;

use common::{MenuItemId, OrderId, OrderStatus, Principal, RestaurantId, UserId};
use queue::{JobStore, NewJob, NotificationQueue};
use store::{NewOrder, NewOrderItem, Notification, Order, OrderWithItems, Store};

use crate::error::{DomainError, Result};
use crate::transitions::{TransitionPolicy, allow_any};

/// Order creation payload as submitted by a client.
///
/// Fields are optional because the payload is untrusted; [`OrderService`]
/// validates and rejects incomplete data. The order's owner is never part
/// of the payload, it always comes from the authenticated principal.
#[derive(Debug, Clone, Default)]
pub struct CreateOrder {
    pub restaurant_id: Option<RestaurantId>,
    pub total_amount: Option<BigDecimal>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<CreateOrderItem>,
}

/// One line item of a [`CreateOrder`] payload.
#[derive(Debug, Clone, Default)]
pub struct CreateOrderItem {
    pub menu_item_id: Option<MenuItemId>,
    pub quantity: Option<i32>,
    pub unit_price: Option<BigDecimal>,
    pub notes: Option<String>,
}

impl CreateOrder {
    /// Checks required fields and produces the insert payload.
    fn into_new_order(self, user_id: UserId) -> Result<NewOrder> {
        let missing = || DomainError::Validation("Missing required order data".to_string());

        let restaurant_id = self.restaurant_id.ok_or_else(missing)?;
        let total_amount = self.total_amount.ok_or_else(missing)?;
        let address = self.address.filter(|a| !a.trim().is_empty()).ok_or_else(missing)?;
        let phone = self.phone.filter(|p| !p.trim().is_empty()).ok_or_else(missing)?;
        if self.items.is_empty() {
            return Err(missing());
        }

        let items = self
            .items
            .into_iter()
            .map(|item| {
                let missing =
                    || DomainError::Validation("Missing required order item data".to_string());
                Ok(NewOrderItem {
                    menu_item_id: item.menu_item_id.ok_or_else(missing)?,
                    quantity: item.quantity.filter(|q| *q >= 1).ok_or_else(missing)?,
                    unit_price: item.unit_price.ok_or_else(missing)?,
                    notes: item.notes,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(NewOrder {
            user_id,
            restaurant_id,
            status: OrderStatus::Pending,
            total_amount,
            address,
            phone,
            notes: self.notes,
            items,
        })
    }
}

/// Service for managing orders and the notifications they trigger.
///
/// Mutations enqueue notification jobs on the injected queue after the
/// storage write commits; a queue hiccup is logged but never rolls back
/// or fails the order operation.
pub struct OrderService<S, J> {
    store: Arc<S>,
    queue: NotificationQueue<J>,
    policy: TransitionPolicy,
}

impl<S, J> OrderService<S, J>
where
    S: Store,
    J: JobStore,
{
    /// Creates an order service with the permissive transition policy.
    pub fn new(store: Arc<S>, queue: NotificationQueue<J>) -> Self {
        Self {
            store,
            queue,
            policy: allow_any,
        }
    }

    /// Replaces the status transition policy.
    pub fn with_transition_policy(mut self, policy: TransitionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Creates an order with its items in one transaction and enqueues an
    /// `order_created` notification for the owner.
    #[tracing::instrument(skip(self, input), fields(user_id = %principal.id))]
    pub async fn create_order(
        &self,
        principal: &Principal,
        input: CreateOrder,
    ) -> Result<OrderWithItems> {
        let new = input.into_new_order(principal.id)?;
        let created = self.store.create_order(new).await?;

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(
            order_id = %created.order.id,
            restaurant_id = %created.order.restaurant_id,
            items = created.items.len(),
            "order created"
        );

        self.enqueue_notification(
            created.order.id,
            created.order.user_id,
            "order_created".to_string(),
            format!("New order #{} created", created.order.id),
        )
        .await;

        Ok(created)
    }

    /// Sets an order's status and enqueues an `order_<status>`
    /// notification for the order's owner.
    ///
    /// Staff only (admin or restaurant manager). A missing order reports
    /// 404 before any authorization check, so callers cannot probe which
    /// ids exist.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(
        &self,
        principal: &Principal,
        order_id: OrderId,
        status: &str,
    ) -> Result<Order> {
        let new_status = OrderStatus::from_str(status)
            .map_err(|_| DomainError::Validation("Invalid order status".to_string()))?;

        let order = self
            .store
            .order(order_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Order not found".to_string()))?;

        if !principal.is_staff() {
            return Err(DomainError::Authorization(
                "You are not authorized to update this order".to_string(),
            ));
        }

        if !(self.policy)(order.order.status, new_status) {
            return Err(DomainError::Validation(format!(
                "Cannot change order status from {} to {}",
                order.order.status, new_status
            )));
        }

        let updated = self
            .store
            .update_order_status(order_id, new_status)
            .await?
            .ok_or_else(|| DomainError::NotFound("Order not found".to_string()))?;

        metrics::counter!("order_status_updates_total").increment(1);
        tracing::info!(
            order_id = %updated.id,
            status = %updated.status,
            "order status updated"
        );

        self.enqueue_notification(
            updated.id,
            updated.user_id,
            new_status.notification_type(),
            format!("Order #{} status updated: {}", updated.id, new_status),
        )
        .await;

        Ok(updated)
    }

    /// Fetches one order. Visible to its owner and to staff.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, principal: &Principal, order_id: OrderId) -> Result<OrderWithItems> {
        let order = self
            .store
            .order(order_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Order not found".to_string()))?;

        if order.order.user_id != principal.id && !principal.is_staff() {
            return Err(DomainError::Authorization(
                "You are not authorized to access this order".to_string(),
            ));
        }

        Ok(order)
    }

    /// The caller's own orders, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn orders_for_user(&self, principal: &Principal) -> Result<Vec<Order>> {
        Ok(self.store.orders_for_user(principal.id).await?)
    }

    /// All orders against a restaurant, newest first. Staff only.
    #[tracing::instrument(skip(self))]
    pub async fn orders_for_restaurant(
        &self,
        principal: &Principal,
        restaurant_id: RestaurantId,
    ) -> Result<Vec<Order>> {
        if !principal.is_staff() {
            return Err(DomainError::Authorization(
                "You are not authorized to access restaurant orders".to_string(),
            ));
        }
        Ok(self.store.orders_for_restaurant(restaurant_id).await?)
    }

    /// Notifications recorded for an order, newest first. Same visibility
    /// as [`get_order`](Self::get_order).
    #[tracing::instrument(skip(self))]
    pub async fn notifications_for_order(
        &self,
        principal: &Principal,
        order_id: OrderId,
    ) -> Result<Vec<Notification>> {
        self.get_order(principal, order_id).await?;
        Ok(self.store.notifications_for_order(order_id).await?)
    }

    async fn enqueue_notification(
        &self,
        order_id: OrderId,
        user_id: UserId,
        kind: String,
        message: String,
    ) {
        let result = self
            .queue
            .enqueue(NewJob {
                order_id,
                user_id,
                kind: kind.clone(),
                message,
            })
            .await;
        // The order mutation is already committed; a queue failure only
        // costs the notification.
        if let Err(err) = result {
            tracing::error!(
                order_id = %order_id,
                kind = %kind,
                error = %err,
                "failed to enqueue notification job"
            );
        }
    }
}
