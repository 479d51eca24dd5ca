use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::get,
    Router,
};

use tillpoint_core::CustomerId;
use tillpoint_customers::{CustomerPatch, NewCustomer};
use tillpoint_infra::Services;

use crate::app::dto::{self, JsonBody, QueryParams};
use crate::app::errors;
use crate::authz;
use crate::context::{PrincipalContext, RequestContext};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_customers).post(create_customer))
        .route("/debtors", get(list_debtors))
        .route("/:id", get(get_customer).patch(update_customer).delete(delete_customer))
        .route("/:id/debt", get(customer_debt))
}

pub async fn list_customers(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(resp) = authz::require(&principal, "customers.read") {
        return resp;
    }
    dto::respond_items(services.customers.list(&ctx).await)
}

pub async fn create_customer(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
    JsonBody(body): JsonBody<NewCustomer>,
) -> Response {
    if let Err(resp) = authz::require(&principal, "customers.write") {
        return resp;
    }
    dto::respond(StatusCode::CREATED, services.customers.create(&ctx, body).await)
}

pub async fn get_customer(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = authz::require(&principal, "customers.read") {
        return resp;
    }
    let id: CustomerId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    dto::respond(StatusCode::OK, services.customers.get(&ctx, id).await)
}

pub async fn update_customer(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<CustomerPatch>,
) -> Response {
    if let Err(resp) = authz::require(&principal, "customers.write") {
        return resp;
    }
    let id: CustomerId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    dto::respond(StatusCode::OK, services.customers.update(&ctx, id, body).await)
}

pub async fn delete_customer(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = authz::require(&principal, "customers.write") {
        return resp;
    }
    let id: CustomerId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    dto::respond_empty(services.customers.delete(&ctx, id).await)
}

/// `GET /customers/:id/debt?history=true`
pub async fn customer_debt(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    QueryParams(query): QueryParams<dto::DebtQuery>,
) -> Response {
    if let Err(resp) = authz::require(&principal, "customers.read") {
        return resp;
    }
    let id: CustomerId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    errors::outcome_response(
        StatusCode::OK,
        services.debt.customer_debt(&ctx, id, query.history).await,
    )
}

pub async fn list_debtors(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(resp) = authz::require(&principal, "customers.read") {
        return resp;
    }
    errors::outcome_response(StatusCode::OK, services.debt.debtors(&ctx).await)
}
