use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::get,
    Router,
};

use tillpoint_core::StoreId;
use tillpoint_infra::Services;
use tillpoint_stores::{NewStore, StorePatch};

use crate::app::dto::{self, JsonBody};
use crate::authz;
use crate::context::{PrincipalContext, RequestContext};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_stores).post(create_store))
        .route("/:id", get(get_store).patch(update_store).delete(delete_store))
}

pub async fn list_stores(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(resp) = authz::require(&principal, "stores.read") {
        return resp;
    }
    dto::respond_items(services.stores.list_accessible(&ctx).await)
}

pub async fn create_store(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
    JsonBody(body): JsonBody<NewStore>,
) -> Response {
    if let Err(resp) = authz::require(&principal, "stores.write") {
        return resp;
    }
    dto::respond(StatusCode::CREATED, services.stores.create(&ctx, body).await)
}

pub async fn get_store(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = authz::require(&principal, "stores.read") {
        return resp;
    }
    let id: StoreId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    dto::respond(StatusCode::OK, services.stores.get(&ctx, id).await)
}

pub async fn update_store(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<StorePatch>,
) -> Response {
    if let Err(resp) = authz::require(&principal, "stores.write") {
        return resp;
    }
    let id: StoreId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    dto::respond(StatusCode::OK, services.stores.update(&ctx, id, body).await)
}

pub async fn delete_store(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = authz::require(&principal, "stores.write") {
        return resp;
    }
    let id: StoreId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    dto::respond_empty(services.stores.delete(&ctx, id).await)
}
