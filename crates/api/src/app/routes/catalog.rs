use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::get,
    Router,
};

use tillpoint_catalog::{CategoryPatch, NewCategory, NewProduct, ProductPatch};
use tillpoint_core::{CategoryId, ProductId};
use tillpoint_infra::Services;

use crate::app::dto::{self, JsonBody, QueryParams};
use crate::authz;
use crate::context::{PrincipalContext, RequestContext};

pub fn categories_router() -> Router {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route("/:id", get(get_category).patch(update_category).delete(delete_category))
}

pub fn products_router() -> Router {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/:id", get(get_product).patch(update_product).delete(delete_product))
}

pub async fn list_categories(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(resp) = authz::require(&principal, "catalog.read") {
        return resp;
    }
    dto::respond_items(services.catalog.list_categories(&ctx).await)
}

pub async fn create_category(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
    JsonBody(body): JsonBody<NewCategory>,
) -> Response {
    if let Err(resp) = authz::require(&principal, "catalog.write") {
        return resp;
    }
    dto::respond(StatusCode::CREATED, services.catalog.create_category(&ctx, body).await)
}

pub async fn get_category(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = authz::require(&principal, "catalog.read") {
        return resp;
    }
    let id: CategoryId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    dto::respond(StatusCode::OK, services.catalog.get_category(&ctx, id).await)
}

pub async fn update_category(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<CategoryPatch>,
) -> Response {
    if let Err(resp) = authz::require(&principal, "catalog.write") {
        return resp;
    }
    let id: CategoryId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    dto::respond(StatusCode::OK, services.catalog.update_category(&ctx, id, body).await)
}

pub async fn delete_category(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = authz::require(&principal, "catalog.write") {
        return resp;
    }
    let id: CategoryId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    dto::respond_empty(services.catalog.delete_category(&ctx, id).await)
}

pub async fn list_products(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
    QueryParams(query): QueryParams<dto::ProductQuery>,
) -> Response {
    if let Err(resp) = authz::require(&principal, "catalog.read") {
        return resp;
    }
    let filter = query.into();
    dto::respond_items(services.catalog.list_products(&ctx, &filter).await)
}

pub async fn create_product(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
    JsonBody(body): JsonBody<NewProduct>,
) -> Response {
    if let Err(resp) = authz::require(&principal, "catalog.write") {
        return resp;
    }
    dto::respond(StatusCode::CREATED, services.catalog.create_product(&ctx, body).await)
}

pub async fn get_product(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = authz::require(&principal, "catalog.read") {
        return resp;
    }
    let id: ProductId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    dto::respond(StatusCode::OK, services.catalog.get_product(&ctx, id).await)
}

pub async fn update_product(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<ProductPatch>,
) -> Response {
    if let Err(resp) = authz::require(&principal, "catalog.write") {
        return resp;
    }
    let id: ProductId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    dto::respond(StatusCode::OK, services.catalog.update_product(&ctx, id, body).await)
}

pub async fn delete_product(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = authz::require(&principal, "catalog.write") {
        return resp;
    }
    let id: ProductId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    dto::respond_empty(services.catalog.delete_product(&ctx, id).await)
}
