use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Router,
};

use tillpoint_core::CustomerId;
use tillpoint_infra::Services;

use crate::app::dto::{self, JsonBody};
use crate::authz;
use crate::context::{PrincipalContext, RequestContext};

pub fn router() -> Router {
    Router::new()
        .route("/market-basket", post(market_basket))
        .route("/debt-risk", get(debt_risk))
        .route("/debt-risk/:customer_id", get(debt_risk_for_customer))
}

pub async fn market_basket(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
    JsonBody(body): JsonBody<dto::MarketBasketRequest>,
) -> Response {
    if let Err(resp) = authz::require(&principal, "analytics.read") {
        return resp;
    }
    dto::respond(
        StatusCode::OK,
        services.analytics.market_basket(&ctx, body.into_params()).await,
    )
}

pub async fn debt_risk(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(resp) = authz::require(&principal, "analytics.read") {
        return resp;
    }
    dto::respond_items(services.analytics.debt_risk(&ctx).await)
}

pub async fn debt_risk_for_customer(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(customer_id): Path<String>,
) -> Response {
    if let Err(resp) = authz::require(&principal, "analytics.read") {
        return resp;
    }
    let customer_id: CustomerId = match dto::parse_id(&customer_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    dto::respond(
        StatusCode::OK,
        services.analytics.debt_risk_for(&ctx, customer_id).await,
    )
}
