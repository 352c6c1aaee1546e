use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AdminClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub role: String,
    pub exp: usize,
}

pub fn is_admin_role(role: &str) -> bool {
    role == "ADMIN" || role == "SUPER_ADMIN"
}

// ============================================================================
// Admin Authentication Middleware
// ============================================================================

pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Extract token
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // 2. Decode JWT (HS256)
    let token_data = decode::<AdminClaims>(
        token,
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::warn!(target: "security", path = %req.uri().path(), "admin token rejected: {}", e);
        StatusCode::UNAUTHORIZED
    })?;

    // 3. Check role
    if !is_admin_role(&token_data.claims.role) {
        tracing::warn!(target: "security", sub = %token_data.claims.sub, role = %token_data.claims.role, "non-admin role");
        return Err(StatusCode::FORBIDDEN);
    }

    // 4. Inject claims
    req.extensions_mut().insert(token_data.claims);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_admin_roles_pass() {
        assert!(is_admin_role("ADMIN"));
        assert!(is_admin_role("SUPER_ADMIN"));
        assert!(!is_admin_role("admin"));
        assert!(!is_admin_role("CUSTOMER"));
    }
}
