use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::availability::{string_or_number, Money};

// ============================================================================
// List phase (GraphQL)
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BookingQuery {
    pub limit: u32,
    pub offset: u32,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListCustomer {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

/// Lightweight booking node from the bulk query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookingNode {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub confirmation_code: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub total_price: Option<Money>,
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub customer: Option<ListCustomer>,
    #[serde(default)]
    pub total_participants: Option<i64>,
    /// The node exactly as received.
    #[serde(skip)]
    pub raw: serde_json::Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BookingPage {
    pub total: u64,
    pub nodes: Vec<BookingNode>,
}

// ============================================================================
// Enrichment phase (native booking detail)
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DetailCustomer {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityBooking {
    /// Epoch milliseconds.
    #[serde(default)]
    pub date: Option<i64>,
    #[serde(default)]
    pub total_participants: Option<i64>,
}

/// `GET /booking.json/{confirmationCode}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetail {
    #[serde(default)]
    pub confirmation_code: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub customer: Option<DetailCustomer>,
    #[serde(default)]
    pub total_price: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub total_paid: Option<f64>,
    #[serde(default)]
    pub total_due: Option<f64>,
    #[serde(default)]
    pub activity_bookings: Vec<ActivityBooking>,
    #[serde(skip)]
    pub raw: serde_json::Value,
}

impl BookingDetail {
    /// An empty object or one without any usable field counts as no detail at all.
    pub fn is_empty(&self) -> bool {
        self.confirmation_code.is_none()
            && self.status.is_none()
            && self.customer.is_none()
            && self.total_price.is_none()
            && self.activity_bookings.is_empty()
    }
}

// ============================================================================
// Merged output
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawPayloads {
    pub list: serde_json::Value,
    pub detail: Option<serde_json::Value>,
}

/// One dashboard row. Every field is always populated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AggregatedBookingRecord {
    pub id: String,
    pub confirmation_code: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub date: String,
    pub guest_count: i64,
    pub status: String,
    pub payment_status: String,
    pub amount_minor: i64,
    pub currency: String,
    pub formatted_amount: String,
    pub enriched: bool,
    pub raw: RawPayloads,
}
