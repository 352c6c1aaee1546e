use base64::Engine as _;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::{CoreError, CoreResult};

pub const OCTO_CAPABILITIES_HEADER: &str = "Octo-Capabilities";
pub const DATE_HEADER: &str = "X-Bokun-Date";
pub const ACCESS_KEY_HEADER: &str = "X-Bokun-AccessKey";
pub const SIGNATURE_HEADER: &str = "X-Bokun-Signature";
pub const APP_TOKEN_HEADER: &str = "X-Bokun-App-Access-Token";

/// Timestamp layout the native API signs: second precision, UTC, no offset.
pub const SIGNING_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Headers produced for a single outbound request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignedHeaders(Vec<(&'static str, String)>);

impl SignedHeaders {
    pub fn push(&mut self, name: &'static str, value: impl Into<String>) {
        self.0.push((name, value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(n, v)| (*n, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Authentication strategy for one family of provider endpoints.
///
/// `path_and_query` is the request path exactly as sent, query string included.
pub trait Signer: Send + Sync {
    fn sign(&self, method: &str, path_and_query: &str) -> CoreResult<SignedHeaders>;
}

// ============================================================================
// Bearer (OCTO)
// ============================================================================

/// Static bearer token plus the capability list the OCTO surface should honour.
#[derive(Clone)]
pub struct BearerSigner {
    token: String,
    capabilities: Vec<String>,
}

impl BearerSigner {
    pub fn new(token: impl Into<String>, capabilities: Vec<String>) -> Self {
        Self {
            token: token.into(),
            capabilities,
        }
    }
}

impl Signer for BearerSigner {
    fn sign(&self, _method: &str, _path_and_query: &str) -> CoreResult<SignedHeaders> {
        if self.token.is_empty() {
            return Err(CoreError::Authentication("no OCTO API key configured".into()));
        }
        let mut headers = SignedHeaders::default();
        headers.push("Authorization", format!("Bearer {}", self.token));
        if !self.capabilities.is_empty() {
            headers.push(OCTO_CAPABILITIES_HEADER, self.capabilities.join(", "));
        }
        Ok(headers)
    }
}

// ============================================================================
// HMAC-SHA1 (native API)
// ============================================================================

/// Per-request HMAC-SHA1 signature over `date ‖ access key ‖ METHOD ‖ path?query`.
///
/// The body is never part of the signed string. Signatures are bound to the exact
/// timestamp they were computed for and must not be reused.
#[derive(Clone)]
pub struct HmacSigner {
    access_key: String,
    secret_key: String,
}

impl HmacSigner {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }

    pub fn format_date(now: DateTime<Utc>) -> String {
        now.format(SIGNING_DATE_FORMAT).to_string()
    }

    /// Base64 HMAC-SHA1 of the canonical signing string.
    pub fn signature(&self, date: &str, method: &str, path_and_query: &str) -> CoreResult<String> {
        let mut mac = Hmac::<Sha1>::new_from_slice(self.secret_key.as_bytes())
            .map_err(|e| CoreError::Validation(format!("invalid signing secret: {}", e)))?;
        mac.update(date.as_bytes());
        mac.update(self.access_key.as_bytes());
        mac.update(method.to_ascii_uppercase().as_bytes());
        mac.update(path_and_query.as_bytes());
        Ok(base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
    }

    pub fn sign_at(&self, now: DateTime<Utc>, method: &str, path_and_query: &str) -> CoreResult<SignedHeaders> {
        if self.access_key.is_empty() || self.secret_key.is_empty() {
            return Err(CoreError::Authentication("native API keys not configured".into()));
        }
        let date = Self::format_date(now);
        let signature = self.signature(&date, method, path_and_query)?;

        let mut headers = SignedHeaders::default();
        headers.push(DATE_HEADER, date);
        headers.push(ACCESS_KEY_HEADER, self.access_key.clone());
        headers.push(SIGNATURE_HEADER, signature);
        Ok(headers)
    }
}

impl Signer for HmacSigner {
    fn sign(&self, method: &str, path_and_query: &str) -> CoreResult<SignedHeaders> {
        self.sign_at(Utc::now(), method, path_and_query)
    }
}

// ============================================================================
// App access token (GraphQL)
// ============================================================================

/// Carries the OAuth token obtained through the app-install flow.
#[derive(Clone)]
pub struct AppTokenSigner {
    token: String,
}

impl AppTokenSigner {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

impl Signer for AppTokenSigner {
    fn sign(&self, _method: &str, _path_and_query: &str) -> CoreResult<SignedHeaders> {
        let mut headers = SignedHeaders::default();
        headers.push(APP_TOKEN_HEADER, self.token.clone());
        Ok(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const PATH: &str = "/activity.json/42/availabilities?start=2026-10-18&end=2026-10-25&lang=EN&currency=EUR";

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, h, m, s).unwrap()
    }

    #[test]
    fn hmac_matches_known_vector() {
        let signer = HmacSigner::new("ak-123", "secret-xyz");
        let headers = signer.sign_at(at(9, 30, 0), "GET", PATH).unwrap();

        assert_eq!(headers.get(DATE_HEADER), Some("2026-10-18 09:30:00"));
        assert_eq!(headers.get(ACCESS_KEY_HEADER), Some("ak-123"));
        assert_eq!(headers.get(SIGNATURE_HEADER), Some("HIHfpNNT0jGxhj/X2UyW8nrnMFA="));
    }

    #[test]
    fn hmac_is_deterministic_for_same_tuple() {
        let signer = HmacSigner::new("ak-123", "secret-xyz");
        let a = signer.sign_at(at(12, 0, 1), "get", "/booking.json/CHR-1").unwrap();
        let b = signer.sign_at(at(12, 0, 1), "GET", "/booking.json/CHR-1").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn hmac_is_bound_to_path_and_time() {
        let signer = HmacSigner::new("ak-123", "secret-xyz");
        let base = signer.signature("2026-10-18 09:30:00", "GET", PATH).unwrap();

        let other_query = signer.signature("2026-10-18 09:30:00", "GET", "/activity.json/42/availabilities").unwrap();
        let other_time = signer.signature("2026-10-18 09:30:01", "GET", PATH).unwrap();
        let other_method = signer.signature("2026-10-18 09:30:00", "POST", PATH).unwrap();

        assert_ne!(base, other_query);
        assert_ne!(base, other_time);
        assert_ne!(base, other_method);
    }

    #[test]
    fn hmac_requires_keys() {
        let signer = HmacSigner::new("", "secret");
        assert!(matches!(signer.sign("GET", "/x"), Err(CoreError::Authentication(_))));
    }

    #[test]
    fn bearer_declares_capabilities() {
        let signer = BearerSigner::new("octo-key", vec!["octo/pricing".into(), "octo/content".into()]);
        let headers = signer.sign("POST", "/bookings").unwrap();
        assert_eq!(headers.get("authorization"), Some("Bearer octo-key"));
        assert_eq!(headers.get(OCTO_CAPABILITIES_HEADER), Some("octo/pricing, octo/content"));
    }

    #[test]
    fn bearer_without_token_is_an_auth_error() {
        let signer = BearerSigner::new("", vec![]);
        assert!(matches!(signer.sign("GET", "/products/1"), Err(CoreError::Authentication(_))));
    }

    #[test]
    fn app_token_header() {
        let headers = AppTokenSigner::new("tok").sign("POST", "/api/graphql").unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get(APP_TOKEN_HEADER), Some("tok"));
    }
}
