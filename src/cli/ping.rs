use anyhow::Context;
use tracing::info;

use crate::config::AppConfig;

/// Connects to the configured store and pings it
pub async fn run(config: &AppConfig) -> anyhow::Result<()> {
    let manager = super::connection_manager(config)?;

    let store = manager
        .ensure_connected()
        .await
        .with_context(|| format!("Could not connect to {} store", config.store.store_type))?;

    store.ping().await.context("Store did not answer ping")?;

    info!(
        store_type = %config.store.store_type,
        attempts = manager.connect_attempts(),
        "Store reachable"
    );
    println!("PONG ({})", config.store.store_type);

    Ok(())
}
