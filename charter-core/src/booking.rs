use charter_shared::Masked;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{CoreError, CoreResult};

// ============================================================================
// Lifecycle
// ============================================================================

/// Booking lifecycle as tracked by this layer. The provider stays authoritative.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    OnHold,
    /// Accepted by the provider but still waiting on the supplier to confirm.
    AwaitingSupplier,
    Confirmed,
    PaymentPending,
    Paid,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::OnHold => "ON_HOLD",
            BookingStatus::AwaitingSupplier => "AWAITING_SUPPLIER",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::PaymentPending => "PAYMENT_PENDING",
            BookingStatus::Paid => "PAID",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }

    /// Maps an OCTO booking status. Expired holds count as cancelled.
    pub fn from_provider(status: &str) -> Option<Self> {
        match status.to_ascii_uppercase().as_str() {
            "ON_HOLD" => Some(BookingStatus::OnHold),
            "CONFIRMED" | "REDEEMED" => Some(BookingStatus::Confirmed),
            "PENDING" => Some(BookingStatus::AwaitingSupplier),
            "CANCELLED" | "EXPIRED" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }

    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (OnHold, Confirmed)
                | (OnHold, AwaitingSupplier)
                | (OnHold, Cancelled)
                | (AwaitingSupplier, Confirmed)
                | (AwaitingSupplier, Cancelled)
                | (Confirmed, PaymentPending)
                | (Confirmed, Cancelled)
                | (PaymentPending, Paid)
                | (PaymentPending, Cancelled)
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Guests and requests
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuestContact {
    pub first_name: String,
    pub last_name: String,
    pub email: Masked<String>,
    pub phone: Masked<String>,
    pub country: String,
}

impl GuestContact {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim()).trim().to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UnitItem {
    pub unit_id: String,
}

/// Body of `POST /bookings`: one unit item per guest, held for `hold_minutes`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReservationRequest {
    pub product_id: String,
    pub option_id: String,
    pub availability_id: String,
    pub unit_items: Vec<UnitItem>,
    #[serde(rename = "expirationMinutes")]
    pub hold_minutes: u32,
}

impl ReservationRequest {
    pub fn for_guests(
        product_id: &str,
        option_id: &str,
        availability_id: &str,
        unit_id: &str,
        guests: usize,
        hold_minutes: u32,
    ) -> CoreResult<Self> {
        if guests == 0 {
            return Err(CoreError::Validation("at least one guest is required".into()));
        }
        if availability_id.is_empty() {
            return Err(CoreError::Validation("availability slot is required".into()));
        }
        Ok(Self {
            product_id: product_id.to_string(),
            option_id: option_id.to_string(),
            availability_id: availability_id.to_string(),
            unit_items: (0..guests).map(|_| UnitItem { unit_id: unit_id.to_string() }).collect(),
            hold_minutes,
        })
    }
}

/// OCTO contact block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OctoContact {
    pub full_name: String,
    pub first_name: String,
    pub last_name: String,
    pub email_address: Masked<String>,
    pub phone_number: Masked<String>,
    pub country: String,
}

impl From<&GuestContact> for OctoContact {
    fn from(g: &GuestContact) -> Self {
        Self {
            full_name: g.full_name(),
            first_name: g.first_name.clone(),
            last_name: g.last_name.clone(),
            email_address: g.email.clone(),
            phone_number: g.phone.clone(),
            country: g.country.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmUnitItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    pub contact: OctoContact,
}

/// Body of `POST /bookings/{uuid}/confirm`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationRequest {
    pub reseller_reference: String,
    pub contact: OctoContact,
    pub unit_items: Vec<ConfirmUnitItem>,
}

// ============================================================================
// Provider booking
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BookingPricing {
    /// Total in the provider's minor unit at `currency_precision` decimals.
    pub retail: i64,
    pub currency: String,
    #[serde(default = "default_precision")]
    pub currency_precision: u32,
}

fn default_precision() -> u32 {
    2
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BookingUnitItem {
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub unit_id: Option<String>,
    #[serde(default)]
    pub contact: Option<OctoContact>,
}

/// Booking as the OCTO surface returns it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OctoBooking {
    pub uuid: String,
    pub status: String,
    #[serde(default)]
    pub supplier_reference: Option<String>,
    #[serde(default)]
    pub reseller_reference: Option<String>,
    #[serde(default)]
    pub unit_items: Vec<BookingUnitItem>,
    #[serde(default)]
    pub pricing: Option<BookingPricing>,
    #[serde(default)]
    pub utc_expires_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Booking {
    pub id: String,
    pub supplier_reference: Option<String>,
    pub reseller_reference: Option<String>,
    pub status: BookingStatus,
    pub unit_items: Vec<BookingUnitItem>,
    pub pricing: Option<BookingPricing>,
    pub expires_at: Option<String>,
}

impl TryFrom<OctoBooking> for Booking {
    type Error = CoreError;

    fn try_from(b: OctoBooking) -> Result<Self, Self::Error> {
        let status = BookingStatus::from_provider(&b.status)
            .ok_or_else(|| CoreError::Decode(format!("unknown booking status {}", b.status)))?;
        Ok(Self {
            id: b.uuid,
            supplier_reference: b.supplier_reference,
            reseller_reference: b.reseller_reference,
            status,
            unit_items: b.unit_items,
            pricing: b.pricing,
            expires_at: b.utc_expires_at,
        })
    }
}

impl Booking {
    /// Moves to `next` if the lifecycle allows it.
    pub fn transition(&mut self, next: BookingStatus) -> CoreResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(CoreError::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reservation_body_matches_octo_shape() {
        let req = ReservationRequest::for_guests("p1", "DEFAULT", "2026-10-20T10:00:00+02:00", "adult", 3, 30).unwrap();
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["productId"], json!("p1"));
        assert_eq!(v["expirationMinutes"], json!(30));
        assert_eq!(v["unitItems"].as_array().unwrap().len(), 3);
        assert_eq!(v["unitItems"][0], json!({"unitId": "adult"}));
    }

    #[test]
    fn reservation_needs_guests() {
        assert!(ReservationRequest::for_guests("p1", "o", "a", "u", 0, 30).is_err());
    }

    #[test]
    fn lifecycle_rejects_skipping_steps() {
        let mut booking = Booking {
            id: "b1".into(),
            supplier_reference: None,
            reseller_reference: None,
            status: BookingStatus::OnHold,
            unit_items: vec![],
            pricing: None,
            expires_at: None,
        };
        assert!(booking.transition(BookingStatus::PaymentPending).is_err());
        booking.transition(BookingStatus::Confirmed).unwrap();
        booking.transition(BookingStatus::PaymentPending).unwrap();
        assert!(booking.transition(BookingStatus::OnHold).is_err());
        assert_eq!(booking.status, BookingStatus::PaymentPending);
    }

    #[test]
    fn octo_booking_converts() {
        let raw: OctoBooking = serde_json::from_value(json!({
            "uuid": "b-1",
            "status": "ON_HOLD",
            "supplierReference": "SUP-9",
            "unitItems": [{"uuid": "u-1", "unitId": "adult"}],
            "pricing": {"retail": 45000, "currency": "EUR", "currencyPrecision": 2}
        }))
        .unwrap();
        let booking = Booking::try_from(raw).unwrap();
        assert_eq!(booking.status, BookingStatus::OnHold);
        assert_eq!(booking.pricing.unwrap().retail, 45000);

        let raw: OctoBooking = serde_json::from_value(json!({"uuid": "b-3", "status": "PENDING"})).unwrap();
        let booking = Booking::try_from(raw).unwrap();
        assert_eq!(booking.status, BookingStatus::AwaitingSupplier);
        assert!(booking.status.can_transition_to(BookingStatus::Confirmed));
        assert!(!booking.status.can_transition_to(BookingStatus::PaymentPending));

        let raw: OctoBooking = serde_json::from_value(json!({"uuid": "b-2", "status": "WEIRD"})).unwrap();
        assert!(matches!(Booking::try_from(raw), Err(CoreError::Decode(_))));
    }
}
