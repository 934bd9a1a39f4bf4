//! Table booking service.

use std::sync::Arc;

use chrono::NaiveDate;

use common::{BookingId, Principal, RestaurantId};
use store::{Booking, NewBooking, Store};

use crate::error::{DomainError, Result};

/// Booking payload as submitted by a client. Validated by
/// [`BookingService::create_booking`]; the booking owner always comes
/// from the authenticated principal.
#[derive(Debug, Clone, Default)]
pub struct CreateBooking {
    pub restaurant_id: Option<RestaurantId>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub number_of_guests: Option<i32>,
    pub special_requests: Option<String>,
}

/// Service for table reservations.
///
/// Slot exclusivity is not checked here: the store's conditional insert
/// is the single atomic arbiter, so two racing requests for the same
/// slot cannot both win.
pub struct BookingService<S> {
    store: Arc<S>,
}

impl<S: Store> BookingService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Books a slot. The booking starts out `pending`.
    #[tracing::instrument(skip(self, input), fields(user_id = %principal.id))]
    pub async fn create_booking(
        &self,
        principal: &Principal,
        input: CreateBooking,
    ) -> Result<Booking> {
        let missing = || DomainError::Validation("Missing required booking data".to_string());
        let restaurant_id = input.restaurant_id.ok_or_else(missing)?;
        let date = input.date.ok_or_else(missing)?;
        let time = input.time.filter(|t| !t.trim().is_empty()).ok_or_else(missing)?;
        let number_of_guests = input
            .number_of_guests
            .filter(|n| *n >= 1)
            .ok_or_else(missing)?;

        if !self.store.restaurant_exists(restaurant_id).await? {
            return Err(DomainError::NotFound("Restaurant not found".to_string()));
        }

        let booking = self
            .store
            .create_booking(NewBooking {
                user_id: principal.id,
                restaurant_id,
                date,
                time,
                number_of_guests,
                special_requests: input.special_requests,
            })
            .await?;

        metrics::counter!("bookings_created_total").increment(1);
        tracing::info!(
            booking_id = %booking.id,
            restaurant_id = %booking.restaurant_id,
            date = %booking.date,
            time = %booking.time,
            "booking created"
        );

        Ok(booking)
    }

    /// Cancels one of the caller's bookings. A booking owned by someone
    /// else reports NotFound, same as a missing one.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_booking(&self, principal: &Principal, id: BookingId) -> Result<Booking> {
        let booking = self
            .store
            .cancel_booking(id, principal.id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Booking not found".to_string()))?;

        tracing::info!(booking_id = %booking.id, "booking cancelled");
        Ok(booking)
    }

    /// The caller's bookings, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn bookings_for_user(&self, principal: &Principal) -> Result<Vec<Booking>> {
        Ok(self.store.bookings_for_user(principal.id).await?)
    }
}
