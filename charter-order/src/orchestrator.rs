use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use charter_core::booking::{
    Booking, BookingStatus, ConfirmUnitItem, ConfirmationRequest, GuestContact, OctoContact,
    ReservationRequest,
};
use charter_core::payment::{fill_booking_id, CheckoutRequest, CheckoutSession, PaymentGateway};
use charter_core::supplier::BookingProvider;
use charter_core::{CoreError, CoreResult};
use charter_shared::money::{currency_exponent, rescale};

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub hold_minutes: u32,
    pub reference_prefix: String,
    /// Redirect templates; `{booking_id}` is replaced with the provider booking id.
    pub success_url: String,
    pub cancel_url: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            hold_minutes: 30,
            reference_prefix: "CHR".to_string(),
            success_url: "http://localhost:3000/booking/success?booking_id={booking_id}".to_string(),
            cancel_url: "http://localhost:3000/booking/cancelled?booking_id={booking_id}".to_string(),
        }
    }
}

/// What the booking UI submits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub product_id: String,
    pub option_id: String,
    pub availability_id: String,
    pub unit_id: String,
    pub guests: Vec<GuestContact>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Reservation created upstream and still perishable.
#[derive(Debug, Clone)]
pub struct HeldBooking(Booking);

/// Contact details attached; ready for a payment session.
#[derive(Debug, Clone)]
pub struct ConfirmedBooking(Booking);

impl HeldBooking {
    pub fn booking(&self) -> &Booking {
        &self.0
    }
}

impl ConfirmedBooking {
    pub fn booking(&self) -> &Booking {
        &self.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingOutcome {
    pub booking: Booking,
    pub checkout: Option<CheckoutSession>,
    pub payment_skipped: bool,
}

impl BookingOutcome {
    pub fn redirect_url(&self) -> Option<&str> {
        self.checkout.as_ref().map(|c| c.url.as_str())
    }
}

/// Drives reserve → confirm → pay across the provider and the payment gateway.
///
/// Steps are separate round trips with no compensation: a confirmation failure leaves
/// the hold upstream to expire on its own.
pub struct BookingOrchestrator {
    provider: Arc<dyn BookingProvider>,
    gateway: Option<Arc<dyn PaymentGateway>>,
    config: OrchestratorConfig,
}

impl BookingOrchestrator {
    pub fn new(
        provider: Arc<dyn BookingProvider>,
        gateway: Option<Arc<dyn PaymentGateway>>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            provider,
            gateway,
            config,
        }
    }

    pub async fn book(&self, request: &BookingRequest) -> CoreResult<BookingOutcome> {
        validate_guests(&request.guests)?;

        let held = self.reserve(request).await?;
        let confirmed = self.confirm(held, &request.guests).await?;

        match &self.gateway {
            Some(gateway) => {
                let description = request
                    .description
                    .clone()
                    .unwrap_or_else(|| format!("Charter booking for {} guests", request.guests.len()));
                let email = request.guests.first().map(|g| g.email.expose().clone());
                self.pay(gateway.as_ref(), confirmed, &description, email).await
            }
            None => {
                tracing::info!(booking_id = %confirmed.0.id, "payment gateway not configured; skipping checkout");
                Ok(BookingOutcome {
                    booking: confirmed.0,
                    checkout: None,
                    payment_skipped: true,
                })
            }
        }
    }

    /// Step 1: place the hold. Nothing exists upstream if this fails.
    pub async fn reserve(&self, request: &BookingRequest) -> CoreResult<HeldBooking> {
        let reservation = ReservationRequest::for_guests(
            &request.product_id,
            &request.option_id,
            &request.availability_id,
            &request.unit_id,
            request.guests.len(),
            self.config.hold_minutes,
        )?;

        let booking = self
            .provider
            .reserve(&reservation)
            .await
            .map_err(|e| CoreError::Reservation(Box::new(e)))?;

        if booking.status != BookingStatus::OnHold {
            return Err(CoreError::Reservation(Box::new(CoreError::Decode(format!(
                "expected ON_HOLD, provider returned {}",
                booking.status
            )))));
        }

        tracing::info!(
            booking_id = %booking.id,
            guests = request.guests.len(),
            hold_minutes = self.config.hold_minutes,
            "reservation held"
        );
        Ok(HeldBooking(booking))
    }

    /// Step 2: attach contacts to a held reservation.
    pub async fn confirm(&self, held: HeldBooking, guests: &[GuestContact]) -> CoreResult<ConfirmedBooking> {
        validate_guests(guests)?;
        let mut expected = held.0.clone();
        expected
            .transition(BookingStatus::Confirmed)
            .map_err(|e| CoreError::Confirmation(Box::new(e)))?;

        let request = self.confirmation_request(&held.0, guests);

        let booking = match self.provider.confirm(&held.0.id, &request).await {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(
                    booking_id = %held.0.id,
                    expires_at = ?held.0.expires_at,
                    error = %e,
                    "confirmation failed; reservation stays ON_HOLD until it lapses"
                );
                return Err(CoreError::Confirmation(Box::new(e)));
            }
        };

        if booking.status == BookingStatus::AwaitingSupplier {
            tracing::warn!(
                booking_id = %booking.id,
                "provider accepted confirmation but the supplier has not confirmed yet"
            );
            return Err(CoreError::Confirmation(Box::new(CoreError::Validation(format!(
                "booking {} is awaiting supplier confirmation; checkout is not opened until it is confirmed",
                booking.id
            )))));
        }
        if booking.status != BookingStatus::Confirmed {
            return Err(CoreError::Confirmation(Box::new(CoreError::Decode(format!(
                "expected CONFIRMED, provider returned {}",
                booking.status
            )))));
        }

        tracing::info!(
            booking_id = %booking.id,
            reseller_reference = %request.reseller_reference,
            "booking confirmed"
        );
        Ok(ConfirmedBooking(booking))
    }

    /// Step 3: open a checkout session. The booking only reaches PAYMENT_PENDING here;
    /// PAID is reconciled elsewhere.
    pub async fn pay(
        &self,
        gateway: &dyn PaymentGateway,
        confirmed: ConfirmedBooking,
        description: &str,
        customer_email: Option<String>,
    ) -> CoreResult<BookingOutcome> {
        let mut booking = confirmed.0;
        let pricing = booking.pricing.clone().ok_or_else(|| {
            CoreError::Payment(Box::new(CoreError::Validation(format!(
                "booking {} has no pricing",
                booking.id
            ))))
        })?;
        let amount_minor = rescale(
            pricing.retail,
            pricing.currency_precision,
            currency_exponent(&pricing.currency),
        );
        if amount_minor <= 0 {
            return Err(CoreError::Payment(Box::new(CoreError::Validation(format!(
                "booking {} has a non-positive total",
                booking.id
            )))));
        }

        let mut metadata = BTreeMap::new();
        metadata.insert("booking_id".to_string(), booking.id.clone());
        if let Some(supplier) = &booking.supplier_reference {
            metadata.insert("supplier_reference".to_string(), supplier.clone());
        }
        if let Some(reseller) = &booking.reseller_reference {
            metadata.insert("reseller_reference".to_string(), reseller.clone());
        }

        let request = CheckoutRequest {
            booking_id: booking.id.clone(),
            description: description.to_string(),
            amount_minor,
            currency: pricing.currency.to_ascii_lowercase(),
            success_url: fill_booking_id(&self.config.success_url, &booking.id),
            cancel_url: fill_booking_id(&self.config.cancel_url, &booking.id),
            customer_email,
            metadata,
        };

        let session = gateway
            .create_checkout_session(&request)
            .await
            .map_err(|e| CoreError::Payment(Box::new(e)))?;
        if session.url.is_empty() {
            return Err(CoreError::Payment(Box::new(CoreError::Decode(
                "checkout session has no redirect url".into(),
            ))));
        }

        booking.transition(BookingStatus::PaymentPending)?;
        tracing::info!(booking_id = %booking.id, session_id = %session.id, amount_minor, "checkout session created");

        Ok(BookingOutcome {
            booking,
            checkout: Some(session),
            payment_skipped: false,
        })
    }

    fn confirmation_request(&self, held: &Booking, guests: &[GuestContact]) -> ConfirmationRequest {
        let unit_items = guests
            .iter()
            .enumerate()
            .map(|(i, guest)| ConfirmUnitItem {
                uuid: held.unit_items.get(i).and_then(|u| u.uuid.clone()),
                contact: OctoContact::from(guest),
            })
            .collect();

        ConfirmationRequest {
            reseller_reference: reseller_reference(&self.config.reference_prefix),
            contact: OctoContact::from(&guests[0]),
            unit_items,
        }
    }
}

pub fn reseller_reference(prefix: &str) -> String {
    let id = Uuid::new_v4().simple().to_string().to_ascii_uppercase();
    format!("{}-{}", prefix, &id[..10])
}

fn validate_guests(guests: &[GuestContact]) -> CoreResult<()> {
    if guests.is_empty() {
        return Err(CoreError::Validation("at least one guest is required".into()));
    }
    for (i, guest) in guests.iter().enumerate() {
        if guest.first_name.trim().is_empty() || guest.last_name.trim().is_empty() {
            return Err(CoreError::Validation(format!("guest {} is missing a name", i + 1)));
        }
        if !guest.email.expose().contains('@') {
            return Err(CoreError::Validation(format!("guest {} has an invalid email", i + 1)));
        }
        if guest.phone.expose().trim().is_empty() || guest.country.trim().is_empty() {
            return Err(CoreError::Validation(format!("guest {} is missing phone or country", i + 1)));
        }
    }
    Ok(())
}
