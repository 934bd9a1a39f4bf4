//! Booking endpoints.
//!
//! Booking payloads use camelCase keys (`restaurantId`, `numberOfGuests`),
//! matching the web client this API serves.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Value, json};

use common::{BookingId, RestaurantId};
use domain::CreateBooking;
use queue::JobStore;
use store::Store;

use crate::AppState;
use crate::error::ApiError;
use crate::extract::AuthPrincipal;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub restaurant_id: Option<i64>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub number_of_guests: Option<i32>,
    pub special_requests: Option<String>,
}

impl From<CreateBookingRequest> for CreateBooking {
    fn from(req: CreateBookingRequest) -> Self {
        CreateBooking {
            restaurant_id: req.restaurant_id.map(RestaurantId::new),
            date: req.date,
            time: req.time,
            number_of_guests: req.number_of_guests,
            special_requests: req.special_requests,
        }
    }
}

/// POST /api/bookings — reserve a table slot.
pub async fn create<S: Store, J: JobStore>(
    State(state): State<Arc<AppState<S, J>>>,
    AuthPrincipal(principal): AuthPrincipal,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let booking = state.bookings.create_booking(&principal, req.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "data": { "booking": booking }
        })),
    ))
}

/// GET /api/bookings/my-bookings — the caller's bookings.
pub async fn my_bookings<S: Store, J: JobStore>(
    State(state): State<Arc<AppState<S, J>>>,
    AuthPrincipal(principal): AuthPrincipal,
) -> Result<Json<Value>, ApiError> {
    let bookings = state.bookings.bookings_for_user(&principal).await?;

    Ok(Json(json!({
        "status": "success",
        "results": bookings.len(),
        "data": { "bookings": bookings }
    })))
}

/// PUT /api/bookings/:id/cancel — cancel one of the caller's bookings.
pub async fn cancel<S: Store, J: JobStore>(
    State(state): State<Arc<AppState<S, J>>>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(id): Path<BookingId>,
) -> Result<Json<Value>, ApiError> {
    let booking = state.bookings.cancel_booking(&principal, id).await?;

    Ok(Json(json!({
        "status": "success",
        "data": { "booking": booking }
    })))
}
