use anyhow::Context;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;
use wompi_gateway::{handlers, AppState, LoggingOrderEvents, WompiConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = WompiConfig::from_env().context("Failed to load Wompi configuration")?;
    let addr = SocketAddr::new(
        config.host.parse().context("HOST must be an IP address")?,
        config.port,
    );
    let environment = config.environment();
    let auto_capture = config.auto_capture;

    let state = AppState::new(config, Arc::new(LoggingOrderEvents))
        .context("Failed to build application state")?;
    info!(
        environment = ?environment,
        base_url = %state.gateway.client().base_url(),
        auto_capture,
        "Wompi gateway configured"
    );
    let app = handlers::router(state);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "starting wompi-gateway");
    axum::serve(listener, app).await?;
    Ok(())
}
