//! Shift endpoints answer with `{"success": true, "data": …}`.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Router,
};

use tillpoint_core::ShiftId;
use tillpoint_infra::Services;

use crate::app::dto::{self, JsonBody};
use crate::app::errors;
use crate::authz;
use crate::context::{PrincipalContext, RequestContext};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_shifts).post(start_shift))
        .route("/current", get(current_shift))
        .route("/:id", get(get_shift))
        .route("/:id/summary", get(shift_summary))
        .route("/:id/close", post(close_shift))
}

pub async fn start_shift(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
    JsonBody(body): JsonBody<dto::StartShiftRequest>,
) -> Response {
    if let Err(resp) = authz::require(&principal, "shifts.operate") {
        return resp;
    }
    errors::outcome_response(
        StatusCode::CREATED,
        services.shifts.start(&ctx, body.starting_cash).await,
    )
}

pub async fn close_shift(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<dto::CloseShiftRequest>,
) -> Response {
    if let Err(resp) = authz::require(&principal, "shifts.operate") {
        return resp;
    }
    let id: ShiftId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    errors::outcome_response(
        StatusCode::OK,
        services.shifts.close(&ctx, id, body.ending_cash).await,
    )
}

pub async fn shift_summary(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = authz::require(&principal, "shifts.read") {
        return resp;
    }
    let id: ShiftId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    errors::outcome_response(StatusCode::OK, services.shifts.summary(&ctx, id).await)
}

pub async fn current_shift(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(resp) = authz::require(&principal, "shifts.read") {
        return resp;
    }
    errors::outcome_response(StatusCode::OK, services.shifts.current(&ctx).await)
}

pub async fn list_shifts(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(resp) = authz::require(&principal, "shifts.read") {
        return resp;
    }
    errors::outcome_response(StatusCode::OK, services.shifts.list(&ctx).await)
}

pub async fn get_shift(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = authz::require(&principal, "shifts.read") {
        return resp;
    }
    let id: ShiftId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    errors::outcome_response(StatusCode::OK, services.shifts.get(&ctx, id).await)
}
