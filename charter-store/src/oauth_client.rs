use serde_json::json;

use charter_core::oauth::{provider_host, AccessToken, TokenExchangeResponse};
use charter_core::{CoreError, CoreResult};

use crate::app_config::OAuthConfig;
use crate::http::{build_client, transport_error};

/// Swaps an authorization code for the operator's access token.
pub struct TokenExchangeClient {
    http: reqwest::Client,
    timeout_ms: u64,
    host_template: String,
    client_id: String,
    client_secret: String,
}

impl TokenExchangeClient {
    pub fn new(host_template: &str, oauth: &OAuthConfig, timeout_ms: u64) -> CoreResult<Self> {
        Ok(Self {
            http: build_client(timeout_ms)?,
            timeout_ms,
            host_template: host_template.to_string(),
            client_id: oauth.client_id.clone(),
            client_secret: oauth.client_secret.clone(),
        })
    }

    /// Non-2xx responses come back as `UpstreamHttp` with the body exactly as sent.
    pub async fn exchange(&self, domain: &str, code: &str) -> CoreResult<AccessToken> {
        let host = provider_host(&self.host_template, domain)?;
        let response = self
            .http
            .post(format!("{}/appstore/oauth/access_token", host))
            .json(&json!({
                "client_id": self.client_id,
                "client_secret": self.client_secret,
                "code": code,
            }))
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout_ms))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| CoreError::Transport(e.to_string()))?;
        if !status.is_success() {
            tracing::warn!(%domain, status = status.as_u16(), "token exchange rejected");
            return Err(CoreError::UpstreamHttp {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TokenExchangeResponse =
            serde_json::from_str(&body).map_err(|e| CoreError::Decode(format!("token response: {}", e)))?;
        Ok(parsed.into_token(domain))
    }
}
