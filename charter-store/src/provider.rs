use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};

use charter_core::availability::AvailabilityEntry;
use charter_core::booking::{Booking, ConfirmationRequest, OctoBooking, ReservationRequest};
use charter_core::oauth::{provider_host, AccessToken};
use charter_core::records::{BookingDetail, BookingNode, BookingPage, BookingQuery};
use charter_core::signer::{AppTokenSigner, BearerSigner, HmacSigner, Signer};
use charter_core::supplier::{AvailabilitySource, BookingProvider, BookingSource};
use charter_core::{CoreError, CoreResult};

use crate::app_config::ProviderConfig;
use crate::http::{build_client, check_status, read_json, transport_error};

const BOOKINGS_QUERY: &str = r#"query Bookings($limit: Int!, $offset: Int!, $startDate: String, $endDate: String) {
  bookings(limit: $limit, offset: $offset, filter: { startDate: $startDate, endDate: $endDate }) {
    totalCount
    nodes {
      id
      confirmationCode
      status
      startDate
      totalPrice { amount currency }
      paymentStatus
      customer { firstName lastName email phoneNumber }
      totalParticipants
    }
  }
}"#;

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<GraphQlData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlData {
    bookings: GraphQlBookings,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphQlBookings {
    #[serde(default)]
    total_count: u64,
    #[serde(default)]
    nodes: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

/// Every provider surface behind one HTTP client. Each endpoint family carries its own
/// signer: bearer for OCTO, HMAC-SHA1 for the native API, app token for GraphQL.
pub struct ProviderClient {
    http: reqwest::Client,
    timeout_ms: u64,
    octo_base: String,
    native_base: String,
    graphql_base: String,
    bearer: BearerSigner,
    hmac: HmacSigner,
    lang: String,
    currency: String,
    booking_channel_uuid: Option<String>,
}

impl ProviderClient {
    pub fn new(cfg: &ProviderConfig) -> CoreResult<Self> {
        let graphql_base = match &cfg.graphql_base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => provider_host(&cfg.host_template, &cfg.domain)?,
        };
        Ok(Self {
            http: build_client(cfg.request_timeout_ms)?,
            timeout_ms: cfg.request_timeout_ms,
            octo_base: cfg.octo_base_url.trim_end_matches('/').to_string(),
            native_base: cfg.native_base_url.trim_end_matches('/').to_string(),
            graphql_base,
            bearer: BearerSigner::new(cfg.octo_api_key.clone(), cfg.octo_capabilities.clone()),
            hmac: HmacSigner::new(cfg.access_key.clone(), cfg.secret_key.clone()),
            lang: cfg.lang.clone(),
            currency: cfg.currency.clone(),
            booking_channel_uuid: cfg.booking_channel_uuid.clone(),
        })
    }

    async fn send(
        &self,
        signer: &dyn Signer,
        method: Method,
        base: &str,
        path_and_query: &str,
        body: Option<&Value>,
    ) -> CoreResult<reqwest::Response> {
        let headers = signer.sign(method.as_str(), path_and_query)?;
        let url = format!("{}{}", base, path_and_query);

        let mut request = self.http.request(method.clone(), &url);
        for (name, value) in headers.iter() {
            request = request.header(name, value);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        tracing::debug!(%method, path = %path_and_query, "provider request");
        let response = request
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout_ms))?;
        check_status(response).await
    }

    async fn octo_booking(&self, method: Method, path: &str, body: &Value) -> CoreResult<Booking> {
        let response = self.send(&self.bearer, method, &self.octo_base, path, Some(body)).await?;
        let raw: OctoBooking = response
            .json()
            .await
            .map_err(|e| CoreError::Decode(format!("OCTO booking: {}", e)))?;
        Booking::try_from(raw)
    }

    pub fn availability_path(&self, activity_id: &str, start: NaiveDate, end: NaiveDate) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        query.append_pair("start", &start.format("%Y-%m-%d").to_string());
        query.append_pair("end", &end.format("%Y-%m-%d").to_string());
        if let Some(channel) = &self.booking_channel_uuid {
            query.append_pair("bookingChannelUuid", channel);
        }
        query.append_pair("lang", &self.lang);
        query.append_pair("currency", &self.currency);
        format!("/activity.json/{}/availabilities?{}", activity_id, query.finish())
    }
}

fn ensure_path_segment(value: &str, what: &str) -> CoreResult<()> {
    let ok = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(CoreError::Validation(format!("invalid {}: {:?}", what, value)))
    }
}

#[async_trait]
impl BookingProvider for ProviderClient {
    async fn reserve(&self, request: &ReservationRequest) -> CoreResult<Booking> {
        let body = serde_json::to_value(request).map_err(|e| CoreError::Decode(e.to_string()))?;
        self.octo_booking(Method::POST, "/bookings", &body).await
    }

    async fn confirm(&self, booking_id: &str, request: &ConfirmationRequest) -> CoreResult<Booking> {
        ensure_path_segment(booking_id, "booking id")?;
        let body = serde_json::to_value(request).map_err(|e| CoreError::Decode(e.to_string()))?;
        self.octo_booking(Method::POST, &format!("/bookings/{}/confirm", booking_id), &body)
            .await
    }

    async fn get_product(&self, product_id: &str) -> CoreResult<Value> {
        ensure_path_segment(product_id, "product id")?;
        let response = self
            .send(&self.bearer, Method::GET, &self.octo_base, &format!("/products/{}", product_id), None)
            .await?;
        read_json(response).await
    }

    async fn check_availability(&self, body: &Value) -> CoreResult<Value> {
        let response = self
            .send(&self.bearer, Method::POST, &self.octo_base, "/availability", Some(body))
            .await?;
        read_json(response).await
    }
}

#[async_trait]
impl AvailabilitySource for ProviderClient {
    async fn availabilities(&self, activity_id: &str, start: NaiveDate, end: NaiveDate) -> CoreResult<Vec<AvailabilityEntry>> {
        ensure_path_segment(activity_id, "activity id")?;
        let path = self.availability_path(activity_id, start, end);
        let response = self.send(&self.hmac, Method::GET, &self.native_base, &path, None).await?;
        response
            .json()
            .await
            .map_err(|e| CoreError::Decode(format!("availabilities: {}", e)))
    }
}

fn scalar_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A node that fails to decode keeps its id, confirmation code and raw payload so
/// the row still renders with placeholders and can be enriched.
fn decode_node(raw: Value) -> BookingNode {
    match serde_json::from_value::<BookingNode>(raw.clone()) {
        Ok(mut node) => {
            node.raw = raw;
            node
        }
        Err(e) => {
            let id = scalar_string(raw.get("id")).unwrap_or_default();
            tracing::warn!(booking_id = %id, error = %e, "booking node did not decode; keeping raw payload only");
            BookingNode {
                id,
                confirmation_code: scalar_string(raw.get("confirmationCode")),
                status: None,
                start_date: None,
                total_price: None,
                payment_status: None,
                customer: None,
                total_participants: None,
                raw,
            }
        }
    }
}

#[async_trait]
impl BookingSource for ProviderClient {
    async fn list_bookings(&self, token: &AccessToken, query: &BookingQuery) -> CoreResult<BookingPage> {
        let signer = AppTokenSigner::new(token.value.clone());
        let body = json!({
            "query": BOOKINGS_QUERY,
            "variables": {
                "limit": query.limit,
                "offset": query.offset,
                "startDate": query.start_date.map(|d| d.to_string()),
                "endDate": query.end_date.map(|d| d.to_string()),
            }
        });
        let response = self
            .send(&signer, Method::POST, &self.graphql_base, "/api/graphql", Some(&body))
            .await?;
        let parsed: GraphQlResponse = response
            .json()
            .await
            .map_err(|e| CoreError::Decode(format!("graphql: {}", e)))?;

        let Some(data) = parsed.data else {
            let messages: Vec<String> = parsed.errors.into_iter().map(|e| e.message).collect();
            return Err(CoreError::Decode(format!("graphql errors: {}", messages.join("; "))));
        };
        if !parsed.errors.is_empty() {
            tracing::warn!(errors = parsed.errors.len(), "graphql returned partial data");
        }

        let nodes = data.bookings.nodes.into_iter().map(decode_node).collect();

        Ok(BookingPage {
            total: data.bookings.total_count,
            nodes,
        })
    }

    async fn booking_detail(&self, confirmation_code: &str) -> CoreResult<Option<BookingDetail>> {
        ensure_path_segment(confirmation_code, "confirmation code")?;
        let path = format!("/booking.json/{}", confirmation_code);
        let response = match self.send(&self.hmac, Method::GET, &self.native_base, &path, None).await {
            Ok(r) => r,
            Err(CoreError::UpstreamHttp { status: 404, .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        let raw = read_json(response).await?;
        if raw.is_null() || raw.as_object().is_some_and(|o| o.is_empty()) {
            return Ok(None);
        }
        let mut detail: BookingDetail =
            serde_json::from_value(raw.clone()).map_err(|e| CoreError::Decode(format!("booking detail: {}", e)))?;
        detail.raw = raw;
        Ok(Some(detail))
    }
}
