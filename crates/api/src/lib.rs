//! HTTP API server for the ordering system.
//!
//! Exposes order and booking endpoints backed by the domain services,
//! with structured logging (tracing) and Prometheus metrics. The caller
//! identity arrives in `x-user-id` / `x-user-role` headers installed by
//! the upstream gateway.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use domain::{BookingService, OrderService};
use queue::JobStore;
use store::Store;

/// Shared application state accessible from all handlers.
pub struct AppState<S, J> {
    pub orders: OrderService<S, J>,
    pub bookings: BookingService<S>,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, J>(state: Arc<AppState<S, J>>, metrics_handle: PrometheusHandle) -> Router
where
    S: Store + 'static,
    J: JobStore + Clone + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/api/orders", post(routes::orders::create::<S, J>))
        .route(
            "/api/orders/my-orders",
            get(routes::orders::my_orders::<S, J>),
        )
        .route("/api/orders/{id}", get(routes::orders::get::<S, J>))
        .route(
            "/api/orders/{id}/status",
            put(routes::orders::update_status::<S, J>),
        )
        .route(
            "/api/orders/{id}/notifications",
            get(routes::orders::notifications::<S, J>),
        )
        .route(
            "/api/orders/restaurant/{restaurant_id}",
            get(routes::orders::restaurant_orders::<S, J>),
        )
        .route("/api/bookings", post(routes::bookings::create::<S, J>))
        .route(
            "/api/bookings/my-bookings",
            get(routes::bookings::my_bookings::<S, J>),
        )
        .route(
            "/api/bookings/{id}/cancel",
            put(routes::bookings::cancel::<S, J>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
