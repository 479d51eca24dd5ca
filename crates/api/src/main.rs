use anyhow::Context;

use tillpoint_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tillpoint_observability::init();

    let config = AppConfig::from_env().context("loading configuration")?;
    let state = tillpoint_api::app::services::build_state(&config).await?;
    let app = tillpoint_api::app::build_app(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
