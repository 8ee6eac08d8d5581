//! planning-poker server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use tracing_subscriber::EnvFilter;

use planning_poker::app_state::AppState;
use planning_poker::config::ServerConfig;
use planning_poker::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;
    tracing::info!(
        addr = %config.listen_addr,
        room_ttl_secs = config.room_ttl.as_secs(),
        sweep_interval_secs = config.sweep_interval.as_secs(),
        "starting planning-poker"
    );

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    let state = AppState::new(config);

    server::run(listener, state, shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
