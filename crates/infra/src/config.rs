//! Configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! - `BIND_ADDR` - listen address (default: 0.0.0.0:8080)
//! - `JWT_SECRET` - HS256 signing secret (dev default with a warning)
//! - `TOKEN_TTL_MINUTES` - token lifetime (default: 720)
//! - `DATABASE_URL` - Postgres connection string; in-memory storage when unset
//! - `DATABASE_MAX_CONNECTIONS` - pool size (default: 10)
//! - `ANALYTICS_BACKEND` - `heuristic` | `remote` (default: heuristic)
//! - `ANALYTICS_ENDPOINT` - base URL of the remote engine (required for `remote`)
//! - `ANALYTICS_TIMEOUT_SECS` - remote call timeout (default: 10)
//! - `BOOTSTRAP_ADMIN_EMAIL` / `BOOTSTRAP_ADMIN_PASSWORD` / `BOOTSTRAP_STORE_NAME` -
//!   seed an admin and a first store when no users exist
//! - `LOG_FORMAT` - read by `tillpoint-observability`

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

const DEV_JWT_SECRET: &str = "tillpoint-dev-secret-change-me";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {0}: {1}")]
    InvalidEnvVar(String, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyticsBackend {
    Heuristic,
    Remote { endpoint: String, timeout: Duration },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
    pub store_name: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub analytics: AnalyticsBackend,
    pub bootstrap: Option<BootstrapAdmin>,
}

impl AppConfig {
    /// Load configuration from the process environment.
    ///
    /// Calls `dotenvy::dotenv()` to load a `.env` file if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = parse_or("BIND_ADDR", get("BIND_ADDR"), "0.0.0.0:8080".parse().ok())?;

        let jwt_secret = match get("JWT_SECRET") {
            Some(secret) => secret,
            None => {
                warn!("JWT_SECRET not set; using the development secret");
                DEV_JWT_SECRET.to_string()
            }
        };

        let ttl_minutes: i64 = parse_or("TOKEN_TTL_MINUTES", get("TOKEN_TTL_MINUTES"), Some(720))?;
        if ttl_minutes <= 0 {
            return Err(ConfigError::InvalidEnvVar(
                "TOKEN_TTL_MINUTES".to_string(),
                "must be positive".to_string(),
            ));
        }

        let database_max_connections: u32 =
            parse_or("DATABASE_MAX_CONNECTIONS", get("DATABASE_MAX_CONNECTIONS"), Some(10))?;

        let analytics = match get("ANALYTICS_BACKEND").as_deref().unwrap_or("heuristic") {
            "heuristic" => AnalyticsBackend::Heuristic,
            "remote" => {
                let endpoint = get("ANALYTICS_ENDPOINT")
                    .ok_or_else(|| ConfigError::MissingEnvVar("ANALYTICS_ENDPOINT".to_string()))?;
                let secs: u64 =
                    parse_or("ANALYTICS_TIMEOUT_SECS", get("ANALYTICS_TIMEOUT_SECS"), Some(10))?;
                AnalyticsBackend::Remote {
                    endpoint,
                    timeout: Duration::from_secs(secs),
                }
            }
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "ANALYTICS_BACKEND".to_string(),
                    format!("'{other}' (expected heuristic or remote)"),
                ));
            }
        };

        let bootstrap = match (get("BOOTSTRAP_ADMIN_EMAIL"), get("BOOTSTRAP_ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(BootstrapAdmin {
                email,
                password,
                store_name: get("BOOTSTRAP_STORE_NAME").unwrap_or_else(|| "Main Store".to_string()),
            }),
            (None, None) => None,
            _ => {
                return Err(ConfigError::InvalidEnvVar(
                    "BOOTSTRAP_ADMIN_*".to_string(),
                    "BOOTSTRAP_ADMIN_EMAIL and BOOTSTRAP_ADMIN_PASSWORD must be set together"
                        .to_string(),
                ));
            }
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            token_ttl: chrono::Duration::minutes(ttl_minutes),
            database_url: get("DATABASE_URL"),
            database_max_connections,
            analytics,
            bootstrap,
        })
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: Option<T>) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(v) => v
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        None => default.ok_or_else(|| ConfigError::MissingEnvVar(key.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = load(&[]).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(cfg.token_ttl, chrono::Duration::minutes(720));
        assert_eq!(cfg.database_url, None);
        assert_eq!(cfg.database_max_connections, 10);
        assert_eq!(cfg.analytics, AnalyticsBackend::Heuristic);
        assert!(cfg.bootstrap.is_none());
    }

    #[test]
    fn remote_analytics_requires_endpoint() {
        assert!(matches!(
            load(&[("ANALYTICS_BACKEND", "remote")]),
            Err(ConfigError::MissingEnvVar(_))
        ));
        let cfg = load(&[
            ("ANALYTICS_BACKEND", "remote"),
            ("ANALYTICS_ENDPOINT", "http://ml:9000"),
            ("ANALYTICS_TIMEOUT_SECS", "3"),
        ])
        .unwrap();
        assert_eq!(
            cfg.analytics,
            AnalyticsBackend::Remote {
                endpoint: "http://ml:9000".into(),
                timeout: Duration::from_secs(3)
            }
        );
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        assert!(matches!(
            load(&[("TOKEN_TTL_MINUTES", "soon")]),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
        assert!(load(&[("TOKEN_TTL_MINUTES", "0")]).is_err());
        assert!(load(&[("ANALYTICS_BACKEND", "gpu")]).is_err());
    }

    #[test]
    fn bootstrap_needs_both_email_and_password() {
        assert!(load(&[("BOOTSTRAP_ADMIN_EMAIL", "a@b.c")]).is_err());
        let cfg = load(&[
            ("BOOTSTRAP_ADMIN_EMAIL", "a@b.c"),
            ("BOOTSTRAP_ADMIN_PASSWORD", "password123"),
        ])
        .unwrap();
        assert_eq!(cfg.bootstrap.unwrap().store_name, "Main Store");
    }
}
