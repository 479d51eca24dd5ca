//! Infrastructure wiring: repositories, analytics engine, token signer and
//! first-run seeding, assembled from [`AppConfig`].

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use tillpoint_ai::{HeuristicEngine, InsightEngine, RemoteEngine};
use tillpoint_auth::{Hs256Jwt, DEFAULT_COST};
use tillpoint_infra::{db, services::bootstrap_admin, AnalyticsBackend, AppConfig, Repositories, Services};

/// Shared state behind the router.
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<Services>,
    pub jwt: Arc<Hs256Jwt>,
}

impl AppState {
    /// In-memory repositories and the heuristic engine; used by tests.
    pub fn in_memory(jwt_secret: &str, password_cost: u32) -> Self {
        let jwt = Arc::new(Hs256Jwt::new(jwt_secret.as_bytes(), chrono::Duration::hours(12)));
        let services = Services::new(
            &Repositories::in_memory(),
            Arc::new(HeuristicEngine),
            jwt.clone(),
            password_cost,
        );
        Self {
            services: Arc::new(services),
            jwt,
        }
    }
}

pub fn build_engine(backend: &AnalyticsBackend) -> anyhow::Result<Arc<dyn InsightEngine>> {
    Ok(match backend {
        AnalyticsBackend::Heuristic => Arc::new(HeuristicEngine),
        AnalyticsBackend::Remote { endpoint, timeout } => Arc::new(
            RemoteEngine::new(endpoint.clone(), *timeout).context("building analytics client")?,
        ),
    })
}

/// Connect (or fall back to memory), migrate, pick the engine and seed the
/// bootstrap admin when configured.
pub async fn build_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let repos = match &config.database_url {
        Some(url) => {
            let pool = db::connect(url, config.database_max_connections)
                .await
                .context("connecting to postgres")?;
            db::migrate(&pool).await.context("running migrations")?;
            Repositories::postgres(pool)
        }
        None => {
            info!("DATABASE_URL not set; using in-memory repositories");
            Repositories::in_memory()
        }
    };

    let engine = build_engine(&config.analytics)?;
    info!(engine = engine.name(), "analytics engine selected");

    if let Some(admin) = &config.bootstrap {
        if let Some((store, user)) = bootstrap_admin(&repos, admin, DEFAULT_COST)
            .await
            .map_err(|e| anyhow::anyhow!("bootstrap admin: {e}"))?
        {
            info!(store_id = %store.id, user_id = %user.id, "seeded first store and admin");
        }
    }

    let jwt = Arc::new(Hs256Jwt::new(config.jwt_secret.as_bytes(), config.token_ttl));
    let services = Services::new(&repos, engine, jwt.clone(), DEFAULT_COST);
    Ok(AppState {
        services: Arc::new(services),
        jwt,
    })
}
