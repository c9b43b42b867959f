use std::sync::Arc;

use anyhow::Context;

use aula_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    aula_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    tracing::info!(
        bind_addr = %config.bind_addr,
        postgres = config.database_url.is_some(),
        dev_secret = config.uses_dev_secret(),
        "configuration loaded"
    );

    let services = aula_api::app::services::build_services(&config)
        .await
        .context("failed to initialise services")?;
    let app = aula_api::app::build_app(Arc::new(services));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
