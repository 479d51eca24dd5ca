use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::Response};

use tillpoint_infra::services::LoginRequest;
use tillpoint_infra::Services;

use crate::app::dto::{self, JsonBody};

pub async fn login(
    Extension(services): Extension<Arc<Services>>,
    JsonBody(body): JsonBody<LoginRequest>,
) -> Response {
    dto::respond(StatusCode::OK, services.auth.login(body).await)
}
