use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;

use crate::availability::AvailabilityEntry;
use crate::booking::{Booking, ConfirmationRequest, ReservationRequest};
use crate::oauth::AccessToken;
use crate::records::{BookingDetail, BookingPage, BookingQuery};
use crate::CoreResult;

/// OCTO booking surface (bearer scheme).
#[async_trait]
pub trait BookingProvider: Send + Sync {
    async fn reserve(&self, request: &ReservationRequest) -> CoreResult<Booking>;

    async fn confirm(&self, booking_id: &str, request: &ConfirmationRequest) -> CoreResult<Booking>;

    async fn get_product(&self, product_id: &str) -> CoreResult<Value>;

    async fn check_availability(&self, body: &Value) -> CoreResult<Value>;
}

/// Native availability/pricing endpoint (HMAC scheme).
#[async_trait]
pub trait AvailabilitySource: Send + Sync {
    async fn availabilities(
        &self,
        activity_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> CoreResult<Vec<AvailabilityEntry>>;
}

/// Dashboard data: bulk list plus per-booking detail.
#[async_trait]
pub trait BookingSource: Send + Sync {
    async fn list_bookings(&self, token: &AccessToken, query: &BookingQuery) -> CoreResult<BookingPage>;

    /// `Ok(None)` when the provider has nothing for the code.
    async fn booking_detail(&self, confirmation_code: &str) -> CoreResult<Option<BookingDetail>>;
}
