use anyhow::Context;

use leadflow_api::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    leadflow_observability::init();

    let config = ServerConfig::from_env().context("invalid configuration")?;
    if config.database_url.is_none() {
        tracing::warn!("DATABASE_URL not set; using the in-memory store");
    }

    let app = leadflow_api::app::build_app(&config).await?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
