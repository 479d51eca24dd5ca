//! HTTP API: routing, authentication middleware and JSON shaping.

pub mod app;
pub mod authz;
pub mod context;
pub mod middleware;
