use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use tillpoint_auth::role_permissions;

use crate::context::{PrincipalContext, RequestContext};

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

pub async fn whoami(
    Extension(ctx): Extension<RequestContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> impl IntoResponse {
    Json(serde_json::json!({
        "store_id": ctx.store_id,
        "user_id": ctx.user_id,
        "role": ctx.role.as_str(),
        "permissions": role_permissions(principal.principal().role()),
    }))
}
