use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use charter_core::CoreError;

#[derive(Debug)]
pub enum AppError {
    Core(CoreError),
    Unauthorized(String),
    BadRequest(String),
    InternalServerError(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Core(err) => core_status(err),
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub fn core_status(err: &CoreError) -> StatusCode {
    match err {
        CoreError::Authentication(_) | CoreError::NotAuthenticated(_) | CoreError::Signature(_) => {
            StatusCode::UNAUTHORIZED
        }
        CoreError::Validation(_) => StatusCode::BAD_REQUEST,
        CoreError::Reservation(_)
        | CoreError::Confirmation(_)
        | CoreError::Payment(_)
        | CoreError::UpstreamHttp { .. }
        | CoreError::Transport(_)
        | CoreError::Decode(_) => StatusCode::BAD_GATEWAY,
        CoreError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        CoreError::PartialEnrichment { .. } | CoreError::InvalidTransition { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            AppError::Core(err) => {
                if status.is_server_error() {
                    tracing::error!(error = %err, "request failed");
                }
                match err.upstream_parts() {
                    Some((upstream, _)) => json!({ "error": err.to_string(), "upstream_status": upstream }),
                    None => json!({ "error": err.to_string() }),
                }
            }
            AppError::Unauthorized(msg) | AppError::BadRequest(msg) => json!({ "error": msg }),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                json!({ "error": "Internal Server Error" })
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        AppError::Core(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_core_errors_to_status_codes() {
        assert_eq!(
            AppError::from(CoreError::Signature("mismatch".into())).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::from(CoreError::Validation("guests".into())).status(),
            StatusCode::BAD_REQUEST
        );
        let reserve = CoreError::Reservation(Box::new(CoreError::UpstreamHttp {
            status: 500,
            body: "internal".into(),
        }));
        assert_eq!(AppError::from(reserve).status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            AppError::InternalServerError("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
