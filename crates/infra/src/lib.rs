//! Infrastructure layer: configuration, database wiring, repositories and the
//! store-scoped domain services the HTTP layer calls.

pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod repository;
pub mod services;

pub use config::{AnalyticsBackend, AppConfig, BootstrapAdmin, ConfigError};
pub use context::RequestContext;
pub use error::{RepoError, RepoResult, ServiceError, ServiceResult};
pub use repository::Repositories;
pub use services::Services;
