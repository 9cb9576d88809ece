use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use sibyl_backend::core::config::AppConfig;
use sibyl_backend::logging;
use sibyl_backend::server;
use sibyl_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    logging::init(&config.logging);

    let state = AppState::initialize(config)?;

    let bind_addr = format!("127.0.0.1:{}", state.config.server.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    let app: Router = server::router::router(state);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
