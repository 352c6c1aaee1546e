use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::{CoreError, CoreResult};

/// Scopes requested on every install.
pub const OAUTH_SCOPES: [&str; 4] = ["BOOKING_READ", "CUSTOMER_READ", "CHECKOUT_READ", "PRODUCT_READ"];

pub const SIGNATURE_PARAM: &str = "hmac";

// ============================================================================
// Inbound signature verification
// ============================================================================

/// `key=value` pairs sorted by key and joined with `&`, without the signature itself.
pub fn canonical_query(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .filter(|(k, _)| k.as_str() != SIGNATURE_PARAM)
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

fn mac_for(secret: &str, params: &BTreeMap<String, String>) -> CoreResult<Hmac<Sha256>> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|e| CoreError::Validation(format!("invalid app secret: {}", e)))?;
    mac.update(canonical_query(params).as_bytes());
    Ok(mac)
}

/// Hex HMAC-SHA256 the provider attaches to install and callback requests.
pub fn compute_signature(secret: &str, params: &BTreeMap<String, String>) -> CoreResult<String> {
    Ok(hex::encode(mac_for(secret, params)?.finalize().into_bytes()))
}

/// Recomputes the digest and compares in constant time. Fails closed on anything unexpected.
pub fn verify_signature(secret: &str, params: &BTreeMap<String, String>) -> CoreResult<()> {
    if secret.is_empty() {
        return Err(CoreError::Signature("app secret not configured".into()));
    }
    let supplied = params
        .get(SIGNATURE_PARAM)
        .ok_or_else(|| CoreError::Validation(format!("missing parameter: {}", SIGNATURE_PARAM)))?;
    let supplied = hex::decode(supplied.trim())
        .map_err(|_| CoreError::Signature("signature is not valid hex".into()))?;

    mac_for(secret, params)?
        .verify_slice(&supplied)
        .map_err(|_| CoreError::Signature("digest mismatch".into()))
}

fn required<'a>(params: &'a BTreeMap<String, String>, key: &str) -> CoreResult<&'a str> {
    params
        .get(key)
        .map(|v| v.as_str())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| CoreError::Validation(format!("missing parameter: {}", key)))
}

/// Operator domains end up in outbound hostnames, so only a plain label is accepted.
pub fn validate_domain(domain: &str) -> CoreResult<()> {
    let ok = !domain.is_empty()
        && domain.len() <= 63
        && domain.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(CoreError::Validation(format!("invalid domain: {}", domain)))
    }
}

// ============================================================================
// Install / callback parameters
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallParams {
    pub domain: String,
    pub timestamp: String,
}

impl InstallParams {
    /// Presence checks only; run [`verify_signature`] before trusting any value.
    pub fn from_query(params: &BTreeMap<String, String>) -> CoreResult<Self> {
        let domain = required(params, "domain")?.to_string();
        let timestamp = required(params, "timestamp")?.to_string();
        required(params, SIGNATURE_PARAM)?;
        Ok(Self { domain, timestamp })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackParams {
    pub domain: String,
    pub state: String,
    pub timestamp: String,
    pub code: String,
}

impl CallbackParams {
    pub fn from_query(params: &BTreeMap<String, String>) -> CoreResult<Self> {
        let domain = required(params, "domain")?.to_string();
        let state = required(params, "state")?.to_string();
        let timestamp = required(params, "timestamp")?.to_string();
        let code = required(params, "code")?.to_string();
        required(params, SIGNATURE_PARAM)?;
        Ok(Self { domain, state, timestamp, code })
    }
}

// ============================================================================
// State and tokens
// ============================================================================

/// Opaque value round-tripped through the provider's authorize page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OAuthState {
    pub nonce: String,
    pub domain: String,
    pub issued_at: DateTime<Utc>,
}

impl OAuthState {
    pub fn issue(domain: &str) -> Self {
        let mut buf = [0u8; 24];
        rand::rngs::OsRng.fill_bytes(&mut buf);
        Self {
            nonce: hex::encode(buf),
            domain: domain.to_string(),
            issued_at: Utc::now(),
        }
    }
}

/// The operator's provider credential. One per domain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessToken {
    pub value: String,
    pub scopes: Vec<String>,
    pub vendor_id: Option<String>,
    pub domain: String,
    pub acquired_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s.eq_ignore_ascii_case(scope))
    }
}

/// Body returned by the provider's token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenExchangeResponse {
    pub access_token: String,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub vendor_id: Option<serde_json::Value>,
}

impl TokenExchangeResponse {
    pub fn into_token(self, domain: &str) -> AccessToken {
        let scopes = self
            .scope
            .as_deref()
            .unwrap_or_default()
            .split(|c: char| c == ' ' || c == ',')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        let vendor_id = match self.vendor_id {
            Some(serde_json::Value::String(s)) => Some(s),
            Some(serde_json::Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        };
        AccessToken {
            value: self.access_token,
            scopes,
            vendor_id,
            domain: domain.to_string(),
            acquired_at: Utc::now(),
        }
    }
}

/// Expands a host template such as `https://{domain}.bokun.io` for one operator.
pub fn provider_host(template: &str, domain: &str) -> CoreResult<String> {
    validate_domain(domain)?;
    Ok(template.replace("{domain}", domain).trim_end_matches('/').to_string())
}

pub fn authorize_url(
    host: &str,
    client_id: &str,
    redirect_uri: &str,
    state: &OAuthState,
) -> CoreResult<String> {
    let scope = OAUTH_SCOPES.join(" ");
    let url = url::Url::parse_with_params(
        &format!("{}/appstore/oauth/authorize", host),
        &[
            ("client_id", client_id),
            ("scope", scope.as_str()),
            ("redirect_uri", redirect_uri),
            ("state", state.nonce.as_str()),
        ],
    )
    .map_err(|e| CoreError::Validation(format!("invalid provider host {}: {}", host, e)))?;
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "app-secret";

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn canonical_query_is_sorted_and_skips_signature() {
        let p = params(&[("timestamp", "1"), ("hmac", "zz"), ("domain", "charters")]);
        assert_eq!(canonical_query(&p), "domain=charters&timestamp=1");
    }

    #[test]
    fn known_vector_verifies() {
        let p = params(&[
            ("domain", "charters"),
            ("timestamp", "1760779800"),
            ("hmac", "e241af2a880a1b58c061ef87009d7419cb702e30020486e78c8af59329138be7"),
        ]);
        assert!(verify_signature(SECRET, &p).is_ok());
    }

    #[test]
    fn signed_params_round_trip_and_tamper_fails() {
        let mut p = params(&[("domain", "charters"), ("state", "abc"), ("timestamp", "42"), ("code", "c0de")]);
        let sig = compute_signature(SECRET, &p).unwrap();
        p.insert("hmac".into(), sig);
        assert!(verify_signature(SECRET, &p).is_ok());

        for key in ["domain", "state", "timestamp", "code"] {
            let mut tampered = p.clone();
            tampered.insert(key.into(), "evil".into());
            assert!(
                matches!(verify_signature(SECRET, &tampered), Err(CoreError::Signature(_))),
                "tampering {} must fail",
                key
            );
        }
        assert!(matches!(verify_signature("other-secret", &p), Err(CoreError::Signature(_))));
    }

    #[test]
    fn garbage_signature_fails_closed() {
        let p = params(&[("domain", "charters"), ("timestamp", "1"), ("hmac", "not-hex")]);
        assert!(matches!(verify_signature(SECRET, &p), Err(CoreError::Signature(_))));
        assert!(matches!(verify_signature("", &p), Err(CoreError::Signature(_))));
    }

    #[test]
    fn missing_params_are_validation_errors() {
        let p = params(&[("domain", "charters"), ("hmac", "00")]);
        assert!(matches!(InstallParams::from_query(&p), Err(CoreError::Validation(_))));
        let p = params(&[("domain", "charters"), ("timestamp", "1"), ("hmac", "00"), ("state", "s")]);
        assert!(matches!(CallbackParams::from_query(&p), Err(CoreError::Validation(_))));
    }

    #[test]
    fn exchange_response_normalises_scope_and_vendor() {
        let body: TokenExchangeResponse = serde_json::from_value(serde_json::json!({
            "access_token": "tok",
            "scope": "BOOKING_READ CUSTOMER_READ",
            "vendor_id": 1234
        }))
        .unwrap();
        let token = body.into_token("charters");
        assert_eq!(token.vendor_id.as_deref(), Some("1234"));
        assert!(token.has_scope("customer_read"));
        assert_eq!(token.domain, "charters");
    }

    #[test]
    fn authorize_url_carries_all_parameters() {
        let state = OAuthState::issue("charters");
        let host = provider_host("https://{domain}.bokun.io", "charters").unwrap();
        let url = authorize_url(&host, "client-1", "https://app.example.com/callback", &state).unwrap();
        let parsed = url::Url::parse(&url).unwrap();
        let q: BTreeMap<_, _> = parsed.query_pairs().into_owned().collect();

        assert_eq!(parsed.host_str(), Some("charters.bokun.io"));
        assert_eq!(q["client_id"], "client-1");
        assert_eq!(q["scope"], "BOOKING_READ CUSTOMER_READ CHECKOUT_READ PRODUCT_READ");
        assert_eq!(q["redirect_uri"], "https://app.example.com/callback");
        assert_eq!(q["state"], state.nonce);
    }

    #[test]
    fn domains_with_host_characters_are_rejected() {
        assert!(provider_host("https://{domain}.bokun.io", "evil.com/x").is_err());
        assert!(provider_host("https://{domain}.bokun.io", "").is_err());
    }
}
