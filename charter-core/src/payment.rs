use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::CoreResult;

/// Placeholder replaced with the provider booking id in redirect templates.
pub const BOOKING_ID_PLACEHOLDER: &str = "{booking_id}";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub booking_id: String,
    pub description: String,
    /// Total in the gateway's minor unit for `currency`.
    pub amount_minor: i64,
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
    pub customer_email: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
    pub metadata: BTreeMap<String, String>,
}

/// Hosted checkout. Creating a session never marks anything paid; that is reconciled
/// out of band.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout_session(&self, request: &CheckoutRequest) -> CoreResult<CheckoutSession>;
}

pub fn fill_booking_id(template: &str, booking_id: &str) -> String {
    template.replace(BOOKING_ID_PLACEHOLDER, booking_id)
}
