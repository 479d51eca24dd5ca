use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Router,
};

use tillpoint_auth::{NewUser, UserPatch};
use tillpoint_core::UserId;
use tillpoint_infra::services::PasswordChange;
use tillpoint_infra::Services;

use crate::app::dto::{self, JsonBody};
use crate::authz;
use crate::context::{PrincipalContext, RequestContext};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user).patch(update_user))
        .route("/:id/password", post(change_password))
}

pub async fn list_users(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(resp) = authz::require(&principal, "users.read") {
        return resp;
    }
    dto::respond_items(services.users.list(&ctx).await)
}

pub async fn create_user(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
    JsonBody(body): JsonBody<NewUser>,
) -> Response {
    if let Err(resp) = authz::require(&principal, "users.write") {
        return resp;
    }
    dto::respond(StatusCode::CREATED, services.users.create(&ctx, body).await)
}

/// Anyone may read their own record.
pub async fn get_user(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    let id: UserId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    if id != ctx.user_id {
        if let Err(resp) = authz::require(&principal, "users.read") {
            return resp;
        }
    }
    dto::respond(StatusCode::OK, services.users.get(&ctx, id).await)
}

/// Self-service edits are limited to the display name by the service.
pub async fn update_user(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<UserPatch>,
) -> Response {
    let id: UserId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    if id != ctx.user_id {
        if let Err(resp) = authz::require(&principal, "users.write") {
            return resp;
        }
    }
    dto::respond(StatusCode::OK, services.users.update(&ctx, id, body).await)
}

pub async fn change_password(
    Extension(services): Extension<Arc<Services>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<PasswordChange>,
) -> Response {
    let id: UserId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    dto::respond_empty(services.auth.change_password(&ctx, id, body).await)
}
