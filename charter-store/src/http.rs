use std::time::Duration;

use reqwest::{Response, StatusCode};

use charter_core::{truncate_body, CoreError, CoreResult};

pub fn build_client(timeout_ms: u64) -> CoreResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .build()
        .map_err(|e| CoreError::Transport(e.to_string()))
}

pub fn transport_error(err: reqwest::Error, timeout_ms: u64) -> CoreError {
    if err.is_timeout() {
        CoreError::Timeout(timeout_ms)
    } else {
        CoreError::Transport(err.to_string())
    }
}

/// Passes 2xx through. 401/403 become `Authentication`; anything else keeps status and a
/// truncated body.
pub async fn check_status(response: Response) -> CoreResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(CoreError::Authentication(format!(
            "upstream returned {}: {}",
            status.as_u16(),
            truncate_body(&body)
        ))),
        _ => Err(CoreError::UpstreamHttp {
            status: status.as_u16(),
            body: truncate_body(&body),
        }),
    }
}

pub async fn read_json(response: Response) -> CoreResult<serde_json::Value> {
    let text = response.text().await.map_err(|e| CoreError::Transport(e.to_string()))?;
    if text.trim().is_empty() {
        return Ok(serde_json::Value::Null);
    }
    serde_json::from_str(&text).map_err(|e| CoreError::Decode(e.to_string()))
}
