use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::{delete, get, post},
    Router,
};

use tillpoint_core::{OrderId, ProductId};
use tillpoint_infra::services::PutCartItem;
use tillpoint_infra::Services;

use crate::app::dto::{self, JsonBody, QueryParams};
use crate::authz;
use crate::context::{PrincipalContext, RequestContext};

pub fn cart_router() -> Router {
    Router::new()
        .route("/", get(get_cart).delete(clear_cart))
        .route("/items", post(put_item))
        .route("/items/:product_id", delete(remove_item))
        .route("/checkout", post(checkout))
}

pub fn orders_router() -> Router {
    Router::new()
        .route("/", get(list_orders))
        .route("/:id", get(get_order))
        .route("/:id/status", post(update_order_status))
}

pub async fn get_cart(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
    QueryParams(query): QueryParams<dto::CartQuery>,
) -> Response {
    if let Err(resp) = authz::require(&principal, "carts.write") {
        return resp;
    }
    dto::respond(StatusCode::OK, services.storefront.cart(&ctx, query.customer_id).await)
}

pub async fn put_item(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
    JsonBody(body): JsonBody<PutCartItem>,
) -> Response {
    if let Err(resp) = authz::require(&principal, "carts.write") {
        return resp;
    }
    dto::respond(StatusCode::OK, services.storefront.put_item(&ctx, body).await)
}

pub async fn remove_item(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(product_id): Path<String>,
    QueryParams(query): QueryParams<dto::CartQuery>,
) -> Response {
    if let Err(resp) = authz::require(&principal, "carts.write") {
        return resp;
    }
    let product_id: ProductId = match dto::parse_id(&product_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    dto::respond(
        StatusCode::OK,
        services.storefront.remove_item(&ctx, query.customer_id, product_id).await,
    )
}

pub async fn clear_cart(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
    QueryParams(query): QueryParams<dto::CartQuery>,
) -> Response {
    if let Err(resp) = authz::require(&principal, "carts.write") {
        return resp;
    }
    dto::respond_empty(services.storefront.clear(&ctx, query.customer_id).await)
}

pub async fn checkout(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
    JsonBody(body): JsonBody<dto::CartQuery>,
) -> Response {
    if let Err(resp) = authz::require(&principal, "carts.write") {
        return resp;
    }
    dto::respond(
        StatusCode::CREATED,
        services.storefront.checkout(&ctx, body.customer_id).await,
    )
}

pub async fn list_orders(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(resp) = authz::require(&principal, "orders.read") {
        return resp;
    }
    dto::respond_items(services.storefront.list_orders(&ctx).await)
}

pub async fn get_order(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = authz::require(&principal, "orders.read") {
        return resp;
    }
    let id: OrderId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    dto::respond(StatusCode::OK, services.storefront.get_order(&ctx, id).await)
}

pub async fn update_order_status(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<dto::OrderStatusRequest>,
) -> Response {
    if let Err(resp) = authz::require(&principal, "orders.write") {
        return resp;
    }
    let id: OrderId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    dto::respond(
        StatusCode::OK,
        services.storefront.update_status(&ctx, id, body.status).await,
    )
}
