//! # E-Stamp API Server
//!
//! ```text
//! load config ──► tracing ──► SQLite (migrations) ──► gateway + notifier
//!                                                          │
//!            Ctrl+C / SIGTERM ──► graceful stop ◄── serve ◄┘
//! ```

use std::sync::Arc;

use salvo::prelude::*;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use estamp_api::{app_router, gateway::RazorpayGateway, notifier::LogNotifier, shutdown, AppConfig, State};
use estamp_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)),
        )
        .with_target(true)
        .init();

    info!(gateway = ?config.gateway, "Configuration loaded");

    let db = Database::new(DbConfig::new(&config.database.path)).await?;
    info!(path = %config.database.path, "Database ready");

    let gateway = Arc::new(RazorpayGateway::new(config.gateway.clone())?);
    let state = State::from_config(&config, db.clone(), gateway, Arc::new(LogNotifier))?;

    let addr = config.socket_addr()?;
    info!(%addr, "Starting server");

    let listener = TcpListener::new(addr).bind().await;
    let server = Server::new(listener);
    let handle = server.handle();

    tokio::spawn(async move {
        if let Err(error) = shutdown::listen(handle).await {
            error!("failed to listen for shutdown signal: {error}");
        }
    });

    server.serve(app_router(state)).await;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}
