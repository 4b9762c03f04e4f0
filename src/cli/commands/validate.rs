//! Validate configuration command.

use anyhow::Result;
use std::path::Path;
use trading_config::load_config;

pub async fn run(config_path: &Path) -> Result<()> {
    println!("Validating configuration: {:?}", config_path);

    match load_config(config_path) {
        Ok(config) => {
            println!("Configuration is valid!");
            println!();
            println!("App: {}", config.app.name);
            println!("Environment: {}", config.app.environment);
            println!("Log level: {}", config.logging.level);
            println!("Listen port: {}", config.server.port);
            println!("Client buffer: {}", config.server.client_buffer);
            println!("Tick interval: {}ms", config.ticker.interval_ms);
            println!(
                "Symbols: {}",
                config
                    .ticker
                    .symbols
                    .iter()
                    .map(|s| s.symbol.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        Err(e) => {
            println!("Configuration error: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
