//! Configuration structures.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub ticker: TickerSettings,
}

/// General app settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "trading-server".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// HTTP/WebSocket server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Listen port
    pub port: u16,
    /// Per-client outbound queue depth; overflow evicts the client
    pub client_buffer: usize,
    /// Seconds a client may stay silent before the session is closed
    pub read_timeout_secs: u64,
    /// Seconds allowed for one outbound frame write
    pub write_timeout_secs: u64,
    /// Seconds between pings on the write side
    pub ping_interval_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8080,
            client_buffer: 256,
            read_timeout_secs: 60,
            write_timeout_secs: 10,
            ping_interval_secs: 54,
        }
    }
}

/// Synthetic tick generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerSettings {
    /// Milliseconds between generated ticks
    pub interval_ms: u64,
    /// Seed for reproducible tick streams; random when unset
    pub seed: Option<u64>,
    pub symbols: Vec<SymbolSettings>,
}

/// One symbol tracked by the synthetic tick source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolSettings {
    pub symbol: String,
    pub start_price: Decimal,
}

impl Default for TickerSettings {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            seed: None,
            symbols: vec![
                SymbolSettings {
                    symbol: "BTC/USD".to_string(),
                    start_price: dec!(40000),
                },
                SymbolSettings {
                    symbol: "ETH/USD".to_string(),
                    start_price: dec!(2500),
                },
                SymbolSettings {
                    symbol: "SOL/USD".to_string(),
                    start_price: dec!(100),
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.ticker.interval_ms, 1000);
        assert_eq!(config.ticker.symbols.len(), 3);
        assert!(config.ticker.seed.is_none());
    }

    #[test]
    fn test_round_trip() {
        let config = AppConfig::default();
        let toml = toml_like_round_trip(&config);
        assert_eq!(toml.server.client_buffer, config.server.client_buffer);
    }

    fn toml_like_round_trip(config: &AppConfig) -> AppConfig {
        let json = serde_json::to_string(config).unwrap();
        serde_json::from_str(&json).unwrap()
    }
}
