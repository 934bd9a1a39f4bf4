//! Order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use bigdecimal::BigDecimal;
use serde::Deserialize;
use serde_json::{Value, json};

use common::{MenuItemId, OrderId, RestaurantId};
use domain::{CreateOrder, CreateOrderItem};
use queue::JobStore;
use store::Store;

use crate::AppState;
use crate::error::ApiError;
use crate::extract::AuthPrincipal;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub restaurant_id: Option<i64>,
    pub total_amount: Option<BigDecimal>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
}

#[derive(Deserialize)]
pub struct OrderItemRequest {
    pub menu_item_id: Option<i64>,
    pub quantity: Option<i32>,
    pub unit_price: Option<BigDecimal>,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}

impl From<CreateOrderRequest> for CreateOrder {
    fn from(req: CreateOrderRequest) -> Self {
        CreateOrder {
            restaurant_id: req.restaurant_id.map(RestaurantId::new),
            total_amount: req.total_amount,
            address: req.address,
            phone: req.phone,
            notes: req.notes,
            items: req
                .items
                .into_iter()
                .map(|item| CreateOrderItem {
                    menu_item_id: item.menu_item_id.map(MenuItemId::new),
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    notes: item.notes,
                })
                .collect(),
        }
    }
}

// -- Handlers --

/// POST /api/orders — create an order with its items.
pub async fn create<S: Store, J: JobStore>(
    State(state): State<Arc<AppState<S, J>>>,
    AuthPrincipal(principal): AuthPrincipal,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let order = state.orders.create_order(&principal, req.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "data": { "order": order }
        })),
    ))
}

/// GET /api/orders/my-orders — the caller's orders.
pub async fn my_orders<S: Store, J: JobStore>(
    State(state): State<Arc<AppState<S, J>>>,
    AuthPrincipal(principal): AuthPrincipal,
) -> Result<Json<Value>, ApiError> {
    let orders = state.orders.orders_for_user(&principal).await?;

    Ok(Json(json!({
        "status": "success",
        "results": orders.len(),
        "data": { "orders": orders }
    })))
}

/// GET /api/orders/:id — one order with items.
pub async fn get<S: Store, J: JobStore>(
    State(state): State<Arc<AppState<S, J>>>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(id): Path<OrderId>,
) -> Result<Json<Value>, ApiError> {
    let order = state.orders.get_order(&principal, id).await?;

    Ok(Json(json!({
        "status": "success",
        "data": { "order": order }
    })))
}

/// PUT /api/orders/:id/status — set an order's status (staff only).
pub async fn update_status<S: Store, J: JobStore>(
    State(state): State<Arc<AppState<S, J>>>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(id): Path<OrderId>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, ApiError> {
    let status = req.status.as_deref().unwrap_or_default();
    let order = state.orders.update_status(&principal, id, status).await?;

    Ok(Json(json!({
        "status": "success",
        "data": { "order": order }
    })))
}

/// GET /api/orders/:id/notifications — notifications recorded for an order.
pub async fn notifications<S: Store, J: JobStore>(
    State(state): State<Arc<AppState<S, J>>>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(id): Path<OrderId>,
) -> Result<Json<Value>, ApiError> {
    let notifications = state.orders.notifications_for_order(&principal, id).await?;

    Ok(Json(json!({
        "status": "success",
        "results": notifications.len(),
        "data": { "notifications": notifications }
    })))
}

/// GET /api/orders/restaurant/:restaurant_id — a restaurant's orders
/// (staff only).
pub async fn restaurant_orders<S: Store, J: JobStore>(
    State(state): State<Arc<AppState<S, J>>>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(restaurant_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let orders = state
        .orders
        .orders_for_restaurant(&principal, RestaurantId::new(restaurant_id))
        .await?;

    Ok(Json(json!({
        "status": "success",
        "results": orders.len(),
        "data": { "orders": orders }
    })))
}
