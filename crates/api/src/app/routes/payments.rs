use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::get,
    Router,
};

use tillpoint_core::TransactionId;
use tillpoint_infra::Services;
use tillpoint_sales::NewCashTransaction;

use crate::app::dto::{self, JsonBody, QueryParams};
use crate::authz;
use crate::context::{PrincipalContext, RequestContext};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_payments).post(record_payment))
        .route("/:id", get(get_payment))
}

pub async fn record_payment(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
    JsonBody(body): JsonBody<NewCashTransaction>,
) -> Response {
    if let Err(resp) = authz::require(&principal, "payments.create") {
        return resp;
    }
    dto::respond(StatusCode::CREATED, services.sales.record_payment(&ctx, body).await)
}

pub async fn list_payments(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
    QueryParams(query): QueryParams<dto::LedgerQuery>,
) -> Response {
    if let Err(resp) = authz::require(&principal, "payments.read") {
        return resp;
    }
    let filter = query.into();
    dto::respond_items(services.sales.list_payments(&ctx, &filter).await)
}

pub async fn get_payment(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = authz::require(&principal, "payments.read") {
        return resp;
    }
    let id: TransactionId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    dto::respond(StatusCode::OK, services.sales.get_payment(&ctx, id).await)
}
