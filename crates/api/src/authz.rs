//! Permission guard applied by handlers before calling a service.

use axum::http::StatusCode;
use axum::response::Response;

use tillpoint_auth::{authorize, Permission};

use crate::app::errors;
use crate::context::PrincipalContext;

/// Reject with 403 unless the principal holds `permission` in its active store.
pub fn require(principal: &PrincipalContext, permission: &'static str) -> Result<(), Response> {
    authorize(principal.principal(), &Permission::new(permission))
        .map_err(|e| errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string()))
}
