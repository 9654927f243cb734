//! Deadline sweeper service
//!
//! Runs the periodic sweep against a funding ledger data directory.
//! Configuration comes from a TOML file passed as the first argument, or
//! from environment variables when no file is given.

use funding_core::{CampaignLocks, Config, Metrics, Storage};
use reconciliation::{DeadlineSweeper, OutboundEvents};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };

    tracing::info!(
        data_dir = ?config.data_dir,
        interval_secs = config.sweep_interval_secs,
        "Starting deadline sweeper"
    );

    let storage = Arc::new(Storage::open(&config)?);
    let locks = Arc::new(CampaignLocks::new());
    let outbound = OutboundEvents::default();
    let metrics = Arc::new(Metrics::new()?);

    let sweeper = Arc::new(DeadlineSweeper::new(
        storage,
        locks,
        outbound,
        metrics,
        Duration::from_secs(config.sweep_interval_secs),
    ));

    sweeper.run().await;

    Ok(())
}
