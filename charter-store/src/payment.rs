use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;

use charter_core::payment::{CheckoutRequest, CheckoutSession, PaymentGateway};
use charter_core::{CoreError, CoreResult};

use crate::http::{build_client, check_status, transport_error};

#[derive(Debug, Deserialize)]
struct SessionResponse {
    id: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
}

/// Hosted checkout through `POST /v1/checkout/sessions`.
pub struct StripeCheckoutGateway {
    http: reqwest::Client,
    timeout_ms: u64,
    base_url: String,
    secret_key: String,
}

impl StripeCheckoutGateway {
    pub fn new(base_url: &str, secret_key: &str, timeout_ms: u64) -> CoreResult<Self> {
        Ok(Self {
            http: build_client(timeout_ms)?,
            timeout_ms,
            base_url: base_url.trim_end_matches('/').to_string(),
            secret_key: secret_key.to_string(),
        })
    }

    /// Form fields in the gateway's bracketed notation, one line item for the whole booking.
    pub fn form_fields(request: &CheckoutRequest) -> Vec<(String, String)> {
        let mut fields = vec![
            ("mode".to_string(), "payment".to_string()),
            ("success_url".to_string(), request.success_url.clone()),
            ("cancel_url".to_string(), request.cancel_url.clone()),
            ("client_reference_id".to_string(), request.booking_id.clone()),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            ("line_items[0][price_data][currency]".to_string(), request.currency.clone()),
            (
                "line_items[0][price_data][unit_amount]".to_string(),
                request.amount_minor.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]".to_string(),
                request.description.clone(),
            ),
        ];
        if let Some(email) = &request.customer_email {
            fields.push(("customer_email".to_string(), email.clone()));
        }
        for (key, value) in &request.metadata {
            fields.push((format!("metadata[{}]", key), value.clone()));
        }
        fields
    }
}

#[async_trait]
impl PaymentGateway for StripeCheckoutGateway {
    async fn create_checkout_session(&self, request: &CheckoutRequest) -> CoreResult<CheckoutSession> {
        let response = self
            .http
            .post(format!("{}/v1/checkout/sessions", self.base_url))
            .bearer_auth(&self.secret_key)
            .header("Idempotency-Key", format!("checkout-{}", request.booking_id))
            .form(&Self::form_fields(request))
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout_ms))?;
        let response = check_status(response).await?;

        let session: SessionResponse = response
            .json()
            .await
            .map_err(|e| CoreError::Decode(format!("checkout session: {}", e)))?;
        let url = session
            .url
            .filter(|u| !u.is_empty())
            .ok_or_else(|| CoreError::Decode(format!("checkout session {} has no url", session.id)))?;

        Ok(CheckoutSession {
            id: session.id,
            url,
            metadata: session.metadata,
        })
    }
}
