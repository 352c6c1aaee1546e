use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use charter_core::booking::{BookingStatus, GuestContact};
use charter_order::BookingRequest;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub availability_id: String,
    pub guests: Vec<GuestContact>,
    pub product_id: Option<String>,
    pub option_id: Option<String>,
    pub unit_id: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub booking_id: String,
    pub status: BookingStatus,
    pub supplier_reference: Option<String>,
    pub reseller_reference: Option<String>,
    pub redirect_url: Option<String>,
    pub payment_skipped: bool,
}

/// Runs reserve → confirm → pay. The first failing step's error is returned as is.
pub async fn create_booking(
    State(state): State<AppState>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    let request = BookingRequest {
        product_id: req.product_id.unwrap_or_else(|| state.booking.product_id.clone()),
        option_id: req.option_id.unwrap_or_else(|| state.booking.option_id.clone()),
        availability_id: req.availability_id,
        unit_id: req.unit_id.unwrap_or_else(|| state.booking.unit_id.clone()),
        guests: req.guests,
        description: req.description,
    };

    let outcome = state.orchestrator.book(&request).await?;

    Ok((
        StatusCode::CREATED,
        Json(BookingResponse {
            redirect_url: outcome.redirect_url().map(str::to_string),
            booking_id: outcome.booking.id,
            status: outcome.booking.status,
            supplier_reference: outcome.booking.supplier_reference,
            reseller_reference: outcome.booking.reseller_reference,
            payment_skipped: outcome.payment_skipped,
        }),
    ))
}
