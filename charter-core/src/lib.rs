pub mod availability;
pub mod booking;
pub mod oauth;
pub mod payment;
pub mod records;
pub mod repository;
pub mod signer;
pub mod supplier;

/// Failure taxonomy shared by every layer that talks to the provider or the payment gateway.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Missing or rejected credential on an outbound call (upstream 401/403).
    #[error("Authentication failed: {0}")]
    Authentication(String),
    /// No token is stored for the operator domain; the caller should offer an install action.
    #[error("Not authenticated for domain {0}")]
    NotAuthenticated(String),
    /// Inbound OAuth request whose HMAC did not verify.
    #[error("Signature verification failed: {0}")]
    Signature(String),
    #[error("Upstream returned HTTP {status}: {body}")]
    UpstreamHttp { status: u16, body: String },
    #[error("Reservation failed: {0}")]
    Reservation(Box<CoreError>),
    #[error("Confirmation failed: {0}")]
    Confirmation(Box<CoreError>),
    #[error("Payment session failed: {0}")]
    Payment(Box<CoreError>),
    /// Non-fatal: one record could not be enriched and fell back to list fields.
    #[error("Enrichment failed for {code}: {reason}")]
    PartialEnrichment { code: String, reason: String },
    #[error("Invalid booking transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Could not decode upstream payload: {0}")]
    Decode(String),
    #[error("Timed out after {0}ms")]
    Timeout(u64),
}

impl CoreError {
    /// Status and body to hand back to a caller when the failure came from upstream.
    pub fn upstream_parts(&self) -> Option<(u16, &str)> {
        match self {
            CoreError::UpstreamHttp { status, body } => Some((*status, body.as_str())),
            CoreError::Reservation(inner) | CoreError::Confirmation(inner) | CoreError::Payment(inner) => {
                inner.upstream_parts()
            }
            _ => None,
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

/// Upstream bodies are cut to this many characters before they are attached to an error.
pub const MAX_ERROR_BODY: usize = 500;

pub fn truncate_body(body: &str) -> String {
    if body.chars().count() <= MAX_ERROR_BODY {
        body.to_string()
    } else {
        let cut: String = body.chars().take(MAX_ERROR_BODY).collect();
        format!("{}…", cut)
    }
}
