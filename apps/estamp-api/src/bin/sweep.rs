//! Stale Order Sweep
//!
//! Cancels `pending_payment` orders older than `sweep.pending_max_age_minutes`.
//! Meant to run from cron; each run is one pass.

use chrono::{Duration, Utc};
use tracing::info;
use tracing_subscriber::EnvFilter;

use estamp_api::AppConfig;
use estamp_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)),
        )
        .init();

    let db = Database::new(DbConfig::new(&config.database.path)).await?;
    let cutoff = Utc::now() - Duration::minutes(config.sweep.pending_max_age_minutes);

    let cancelled = db.orders().cancel_stale_pending(cutoff).await?;
    info!(cancelled, %cutoff, "Stale pending orders swept");

    db.close().await;
    Ok(())
}
