use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::debug;

use tillpoint_auth::{JwtValidator, Principal};
use tillpoint_core::StoreId;

use crate::app::errors;
use crate::context::PrincipalContext;

/// Header selecting a store other than the token's default.
pub const STORE_HEADER: &str = "x-store-id";

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
}

/// Verify the bearer token, resolve the active store and attach the
/// principal and request context to the request.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let token = match extract_bearer(req.headers()) {
        Ok(t) => t,
        Err(msg) => return errors::json_error(StatusCode::UNAUTHORIZED, "unauthorized", msg),
    };

    let claims = match state.jwt.validate(token, Utc::now()) {
        Ok(c) => c,
        Err(e) => {
            debug!(error = %e, "token rejected");
            return errors::json_error(StatusCode::UNAUTHORIZED, "unauthorized", "invalid or expired token");
        }
    };

    let requested = match requested_store(req.headers()) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let principal = match Principal::from_claims(&claims, requested) {
        Ok(p) => p,
        Err(e) => return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string()),
    };

    let principal = PrincipalContext::new(principal);
    req.extensions_mut().insert(principal.request_context());
    req.extensions_mut().insert(principal);

    next.run(req).await
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, &'static str> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or("missing bearer token")?;

    let header = header.to_str().map_err(|_| "malformed authorization header")?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or("authorization header must use the Bearer scheme")?
        .trim();
    if token.is_empty() {
        return Err("missing bearer token");
    }

    Ok(token)
}

fn requested_store(headers: &HeaderMap) -> Result<Option<StoreId>, Response> {
    let Some(value) = headers.get(STORE_HEADER) else {
        return Ok(None);
    };
    value
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse::<StoreId>().ok())
        .map(Some)
        .ok_or_else(|| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "X-Store-Id is not a valid store id"))
}
