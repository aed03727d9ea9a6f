use std::sync::Arc;

use anyhow::Context;
use weather_core::{Config, WeatherAggregator, api};

/// Bind and serve until Ctrl-C.
pub async fn run(config: &Config) -> anyhow::Result<()> {
    let aggregator = Arc::new(WeatherAggregator::from_config(config)?);
    let app = api::router(aggregator);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!(%addr, path = api::WEATHER_PATH, "weather endpoint listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
