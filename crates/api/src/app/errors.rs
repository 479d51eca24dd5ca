use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

use tillpoint_core::{ErrorKind, Outcome, OutcomeError};
use tillpoint_infra::ServiceError;

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation | ErrorKind::InvalidId => StatusCode::BAD_REQUEST,
        ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict | ErrorKind::InvalidState => StatusCode::CONFLICT,
        ErrorKind::Invariant => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorKind::Upstream => StatusCode::BAD_GATEWAY,
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({
            "success": false,
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn outcome_error(err: OutcomeError) -> Response {
    json_error(status_for(err.kind), err.kind.code(), err.message)
}

pub fn service_error(err: ServiceError) -> Response {
    outcome_error(err.into())
}

/// `{"success": true, "data": …}` on success, the error body otherwise.
pub fn outcome_response<T: Serialize>(status: StatusCode, outcome: Outcome<T>) -> Response {
    match outcome.into_result() {
        Ok(data) => (status, Json(json!({ "success": true, "data": data }))).into_response(),
        Err(err) => outcome_error(err),
    }
}
