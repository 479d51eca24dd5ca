//! Request/query DTOs and small JSON helpers shared by the route modules.

use std::str::FromStr;

use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use tillpoint_ai::MarketBasketParams;
use tillpoint_core::{CategoryId, CustomerId, DomainError, UserId};
use tillpoint_infra::repository::{LedgerFilter, ProductFilter};
use tillpoint_infra::ServiceResult;
use tillpoint_sales::OrderStatus;

use crate::app::errors;

// -------------------------
// Extractors
// -------------------------

/// `Json<T>` whose rejection uses the API's JSON error body.
pub struct JsonBody<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(errors::json_error(
                rejection.status(),
                "validation_error",
                rejection.body_text(),
            )),
        }
    }
}

/// `Query<T>` with a JSON rejection body.
pub struct QueryParams<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(QueryParams(value)),
            Err(rejection) => Err(errors::json_error(
                StatusCode::BAD_REQUEST,
                "validation_error",
                rejection.body_text(),
            )),
        }
    }
}

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct StartShiftRequest {
    pub starting_cash: i64,
}

#[derive(Debug, Deserialize)]
pub struct CloseShiftRequest {
    pub ending_cash: i64,
}

#[derive(Debug, Deserialize)]
pub struct OrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct MarketBasketRequest {
    pub min_support: Option<f64>,
    pub min_confidence: Option<f64>,
    pub limit: Option<usize>,
}

impl MarketBasketRequest {
    pub fn into_params(self) -> MarketBasketParams {
        let defaults = MarketBasketParams::default();
        MarketBasketParams {
            min_support: self.min_support.unwrap_or(defaults.min_support),
            min_confidence: self.min_confidence.unwrap_or(defaults.min_confidence),
            limit: self.limit.unwrap_or(defaults.limit),
        }
    }
}

// -------------------------
// Query strings
// -------------------------

#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub q: Option<String>,
    pub category_id: Option<CategoryId>,
}

impl From<ProductQuery> for ProductFilter {
    fn from(q: ProductQuery) -> Self {
        ProductFilter {
            q: q.q.filter(|s| !s.trim().is_empty()),
            category_id: q.category_id,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LedgerQuery {
    pub customer_id: Option<CustomerId>,
    pub user_id: Option<UserId>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl From<LedgerQuery> for LedgerFilter {
    fn from(q: LedgerQuery) -> Self {
        LedgerFilter {
            customer_id: q.customer_id,
            user_id: q.user_id,
            since: q.since,
            until: q.until,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DebtQuery {
    #[serde(default)]
    pub history: bool,
}

#[derive(Debug, Deserialize)]
pub struct CartQuery {
    pub customer_id: CustomerId,
}

// -------------------------
// Response helpers
// -------------------------

pub fn items<T: Serialize>(items: Vec<T>) -> Response {
    (StatusCode::OK, Json(json!({ "items": items }))).into_response()
}

pub fn resource<T: Serialize>(status: StatusCode, value: T) -> Response {
    (status, Json(value)).into_response()
}

/// Plain resource JSON on success, the error body otherwise.
pub fn respond<T: Serialize>(status: StatusCode, result: ServiceResult<T>) -> Response {
    match result {
        Ok(value) => resource(status, value),
        Err(e) => errors::service_error(e),
    }
}

pub fn respond_items<T: Serialize>(result: ServiceResult<Vec<T>>) -> Response {
    match result {
        Ok(list) => items(list),
        Err(e) => errors::service_error(e),
    }
}

pub fn respond_empty(result: ServiceResult<()>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error(e),
    }
}

/// Parse a path id, answering 400 `invalid_id` on garbage.
pub fn parse_id<T>(raw: &str) -> Result<T, Response>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse::<T>()
        .map_err(|e| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", e.to_string()))
}
