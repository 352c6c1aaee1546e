use std::collections::BTreeMap;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use charter_core::oauth::{authorize_url, provider_host, verify_signature, CallbackParams, InstallParams};
use charter_core::CoreError;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/install", get(install))
        .route("/callback", get(callback))
        .route("/api/oauth/status", get(status))
}

/// Rejections are never retried and always leave a trace under the `security` target.
fn verify(secret: &str, params: &BTreeMap<String, String>, endpoint: &str) -> Result<(), AppError> {
    verify_signature(secret, params).map_err(|e| {
        if matches!(e, CoreError::Signature(_)) {
            tracing::warn!(
                target: "security",
                endpoint,
                domain = params.get("domain").map(String::as_str).unwrap_or(""),
                "OAuth request rejected: {}",
                e
            );
        }
        AppError::from(e)
    })
}

async fn install(
    State(state): State<AppState>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Result<Redirect, AppError> {
    let install = InstallParams::from_query(&params)?;
    verify(&state.oauth.client_secret, &params, "install")?;

    let host = provider_host(&state.oauth.host_template, &install.domain)?;
    let oauth_state = state.oauth_states.issue(&install.domain).await;
    let url = authorize_url(&host, &state.oauth.client_id, &state.oauth.redirect_uri, &oauth_state)?;

    tracing::info!(domain = %install.domain, "redirecting to provider authorization");
    Ok(Redirect::temporary(&url))
}

async fn callback(
    State(state): State<AppState>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Result<Response, AppError> {
    let callback = CallbackParams::from_query(&params)?;
    verify(&state.oauth.client_secret, &params, "callback")?;

    if state.oauth.enforce_state {
        if let Err(e) = state.oauth_states.consume(&callback.state, &callback.domain).await {
            tracing::warn!(target: "security", domain = %callback.domain, "OAuth callback rejected: {}", e);
            return Err(e.into());
        }
    }

    let token = match state.token_exchange.exchange(&callback.domain, &callback.code).await {
        Ok(token) => token,
        Err(CoreError::UpstreamHttp { status, body }) => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            return Ok((status, body).into_response());
        }
        Err(e) => return Err(e.into()),
    };
    state.tokens.put(token).await?;

    Ok(Html(format!(
        "<!doctype html><html><head><title>Connected</title></head><body>\
         <h1>Connected</h1><p>The account <strong>{}</strong> is now linked. You can close this window.</p>\
         </body></html>",
        callback.domain
    ))
    .into_response())
}

#[derive(Debug, Serialize)]
pub struct OAuthStatus {
    pub domain: String,
    pub authenticated: bool,
    pub scopes: Vec<String>,
}

async fn status(State(state): State<AppState>) -> Result<Json<OAuthStatus>, AppError> {
    let token = state.tokens.get(&state.domain).await?;
    Ok(Json(OAuthStatus {
        domain: state.domain.clone(),
        authenticated: token.is_some(),
        scopes: token.map(|t| t.scopes).unwrap_or_default(),
    }))
}
