use anyhow::Context;

use bookstock_api::config::ApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ApiConfig::from_env()?;
    bookstock_observability::init(config.log_format);

    let app = bookstock_api::app::build_app(&config).await;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        max_conflict_retries = config.service.max_conflict_retries,
        "listening"
    );

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
