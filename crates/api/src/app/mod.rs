//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: infrastructure wiring (repositories, engine, signer)
//! - `routes/`: HTTP routes + handlers (one file per domain area)
//! - `dto.rs`: request/query DTOs and JSON helpers
//! - `errors.rs`: consistent error responses

use axum::{
    routing::{get, post},
    Extension, Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppState;

/// Build the full HTTP router (used by `main.rs` and the black-box tests).
pub fn build_app(state: AppState) -> Router {
    let auth_state = middleware::AuthState {
        jwt: state.jwt.clone(),
    };

    let protected = routes::router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .route("/auth/login", post(routes::auth::login))
        .merge(protected)
        .layer(Extension(state.services))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}
