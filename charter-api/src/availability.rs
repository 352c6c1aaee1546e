use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use charter_core::availability::{AvailabilitySlot, PricingCategory};
use charter_shared::Envelope;

use crate::error::{core_status, AppError};
use crate::state::AppState;

const SOURCE: &str = "provider";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/availability", get(availability))
        .route("/api/products/{id}", get(product))
        .route("/api/octo/availability", post(octo_availability))
}

#[derive(Debug, Default, Serialize)]
pub struct AvailabilityStats {
    pub window_start: Option<NaiveDate>,
    pub window_end: Option<NaiveDate>,
    pub slots: Vec<AvailabilitySlot>,
    pub available_slots: usize,
}

/// Price categories as `data`; the slots they were read from ride along in `stats`.
async fn availability(
    State(state): State<AppState>,
) -> (StatusCode, Json<Envelope<PricingCategory, AvailabilityStats>>) {
    match state.pricing.fetch_upcoming().await {
        Ok(snapshot) => {
            let available = snapshot.slots.iter().filter(|s| s.available).count();
            let message = format!(
                "{} categories across {} slots",
                snapshot.categories.len(),
                snapshot.slots.len()
            );
            let stats = AvailabilityStats {
                window_start: Some(snapshot.window_start),
                window_end: Some(snapshot.window_end),
                slots: snapshot.slots,
                available_slots: available,
            };
            (
                StatusCode::OK,
                Json(Envelope::ok(snapshot.categories, stats, SOURCE, message)),
            )
        }
        Err(e) => {
            tracing::error!(error = %e, "availability fetch failed");
            (
                core_status(&e),
                Json(Envelope::failed(
                    AvailabilityStats::default(),
                    SOURCE,
                    "Could not load availability",
                    e.to_string(),
                )),
            )
        }
    }
}

async fn product(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, AppError> {
    Ok(Json(state.provider.get_product(&id).await?))
}

/// Fills in the configured product and option when the caller leaves them out.
async fn octo_availability(State(state): State<AppState>, Json(mut body): Json<Value>) -> Result<Json<Value>, AppError> {
    let obj = body
        .as_object_mut()
        .ok_or_else(|| AppError::BadRequest("expected a JSON object".into()))?;
    obj.entry("productId")
        .or_insert_with(|| Value::String(state.booking.product_id.clone()));
    obj.entry("optionId")
        .or_insert_with(|| Value::String(state.booking.option_id.clone()));

    Ok(Json(state.provider.check_availability(&body).await?))
}
