//! tinyircd - a small IRC daemon.
//!
//! A single-process chat server speaking the classic line-oriented IRC
//! protocol: nicknames, channels with topics and join keys, direct and
//! channel messaging, and optional on-disk channel state and activity logs.

mod config;
mod error;
mod handlers;
mod network;
mod state;

use crate::config::Config;
use crate::handlers::Registry;
use crate::network::Gateway;
use crate::state::Hub;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    info!(
        server = %config.server.name,
        ports = ?config.listen.ports,
        "Starting tinyircd"
    );

    if let Some(dir) = &config.storage.state_dir {
        std::fs::create_dir_all(dir)?;
    }
    if let Some(dir) = &config.storage.log_dir {
        std::fs::create_dir_all(dir)?;
    }

    let hub = Arc::new(Hub::new(&config));
    let registry = Arc::new(Registry::new());

    let gateway = Gateway::bind(&config, hub, registry).await?;
    gateway.run().await
}
