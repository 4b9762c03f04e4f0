//! Serve command implementation.

use anyhow::Result;
use std::path::Path;
use tracing::info;

use trading_config::load_config;

use crate::cli::ServeArgs;

pub async fn run(args: ServeArgs, config_path: &Path) -> Result<()> {
    let mut config = load_config(config_path)?;

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(interval) = args.tick_interval_ms {
        config.ticker.interval_ms = interval;
    }

    info!(
        environment = %config.app.environment,
        port = config.server.port,
        tick_interval_ms = config.ticker.interval_ms,
        "starting trading server"
    );

    trading_server::app::serve(config).await
}
