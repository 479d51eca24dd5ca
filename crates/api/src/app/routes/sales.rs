use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::get,
    Router,
};

use tillpoint_core::SaleId;
use tillpoint_infra::Services;
use tillpoint_sales::NewSale;

use crate::app::dto::{self, JsonBody, QueryParams};
use crate::authz;
use crate::context::{PrincipalContext, RequestContext};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_sales).post(record_sale))
        .route("/:id", get(get_sale))
}

pub async fn record_sale(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
    JsonBody(body): JsonBody<NewSale>,
) -> Response {
    if let Err(resp) = authz::require(&principal, "sales.create") {
        return resp;
    }
    dto::respond(StatusCode::CREATED, services.sales.record_sale(&ctx, body).await)
}

pub async fn list_sales(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
    QueryParams(query): QueryParams<dto::LedgerQuery>,
) -> Response {
    if let Err(resp) = authz::require(&principal, "sales.read") {
        return resp;
    }
    let filter = query.into();
    dto::respond_items(services.sales.list_sales(&ctx, &filter).await)
}

pub async fn get_sale(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = authz::require(&principal, "sales.read") {
        return resp;
    }
    let id: SaleId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    dto::respond(StatusCode::OK, services.sales.get_sale(&ctx, id).await)
}
