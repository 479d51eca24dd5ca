use axum::{routing::get, Router};

pub mod analytics;
pub mod auth;
pub mod catalog;
pub mod customers;
pub mod payments;
pub mod sales;
pub mod shifts;
pub mod storefront;
pub mod stores;
pub mod system;
pub mod users;

/// Router for all authenticated (store-scoped) endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/stores", stores::router())
        .nest("/users", users::router())
        .nest("/categories", catalog::categories_router())
        .nest("/products", catalog::products_router())
        .nest("/customers", customers::router())
        .nest("/sales", sales::router())
        .nest("/payments", payments::router())
        .nest("/shifts", shifts::router())
        .nest("/cart", storefront::cart_router())
        .nest("/orders", storefront::orders_router())
        .nest("/analytics", analytics::router())
}
