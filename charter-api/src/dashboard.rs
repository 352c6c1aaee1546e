use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use charter_core::records::{AggregatedBookingRecord, BookingQuery};
use charter_core::CoreError;
use charter_order::BookingStats;
use charter_shared::Envelope;

use crate::error::core_status;
use crate::middleware::AdminClaims;
use crate::state::AppState;

const SOURCE: &str = "provider";
const MAX_PAGE: u32 = 100;

#[derive(Debug, Deserialize)]
pub struct ListBookingsParams {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub enrich: Option<bool>,
}

type BookingsEnvelope = Envelope<AggregatedBookingRecord, BookingStats>;

fn failed(status: StatusCode, message: &str, err: &CoreError) -> (StatusCode, Json<BookingsEnvelope>) {
    (
        status,
        Json(Envelope::failed(BookingStats::default(), SOURCE, message, err.to_string())),
    )
}

/// Always answers with an envelope, even when the provider is unreachable.
pub async fn list_bookings(
    State(state): State<AppState>,
    axum::Extension(claims): axum::Extension<AdminClaims>,
    Query(params): Query<ListBookingsParams>,
) -> (StatusCode, Json<BookingsEnvelope>) {
    let query = BookingQuery {
        limit: params.limit.unwrap_or(state.page_size).clamp(1, MAX_PAGE),
        offset: params.offset.unwrap_or(0),
        start_date: params.start_date,
        end_date: params.end_date,
    };
    let enrich = params.enrich.unwrap_or(true);

    let token = match state.tokens.require(&state.domain).await {
        Ok(token) => token,
        Err(e) => {
            return failed(
                core_status(&e),
                "Provider account not connected; install the app to continue",
                &e,
            )
        }
    };

    tracing::info!(admin = %claims.sub, limit = query.limit, offset = query.offset, enrich, "listing bookings");

    match state.aggregator.aggregate(&token, &query, enrich).await {
        Ok(page) => {
            let message = if page.warnings.is_empty() {
                format!("{} bookings", page.records.len())
            } else {
                format!(
                    "{} bookings ({} without detail)",
                    page.records.len(),
                    page.warnings.len()
                )
            };
            (
                StatusCode::OK,
                Json(Envelope::ok(page.records, page.stats, SOURCE, message)),
            )
        }
        Err(e) => {
            tracing::error!(error = %e, "booking list failed");
            failed(core_status(&e), "Could not load bookings", &e)
        }
    }
}
