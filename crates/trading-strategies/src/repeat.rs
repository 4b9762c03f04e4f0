//! Repeating range strategy.
//!
//! Buys when the price falls to `entry_price`, sells when it rises to
//! `exit_price`, and waits for the next cycle.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use trading_core::error::{ExecutorError, StrategyError};
use trading_core::traits::StrategyExecutor;
use trading_core::types::{StrategyParams, Tick, Trade};
use trading_store::TradeStore;

/// Configuration for the repeat strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepeatConfig {
    /// Symbol to trade; ticks for other symbols are ignored
    pub symbol: String,
    /// Buy when the price is at or below this level
    pub entry_price: Decimal,
    /// Sell when the price is at or above this level
    pub exit_price: Decimal,
}

impl RepeatConfig {
    pub fn validate(&self) -> Result<(), StrategyError> {
        if self.symbol.trim().is_empty() {
            return Err(StrategyError::InvalidConfig(
                "symbol must not be empty".into(),
            ));
        }
        if self.entry_price <= Decimal::ZERO {
            return Err(StrategyError::InvalidConfig(
                "entry_price must be positive".into(),
            ));
        }
        if self.exit_price <= self.entry_price {
            return Err(StrategyError::InvalidConfig(
                "exit_price must be greater than entry_price".into(),
            ));
        }
        Ok(())
    }
}

/// Repeat strategy executor.
pub struct RepeatExecutor {
    config: RepeatConfig,
    trades: Arc<TradeStore>,
    current_trade: Option<Trade>,
}

impl RepeatExecutor {
    pub fn new(config: RepeatConfig, trades: Arc<TradeStore>) -> Self {
        Self {
            config,
            trades,
            current_trade: None,
        }
    }

    /// Build an executor from free-form parameters, validating them.
    pub fn from_params(
        params: &StrategyParams,
        trades: Arc<TradeStore>,
    ) -> Result<Self, StrategyError> {
        let config: RepeatConfig = serde_json::from_value(serde_json::Value::Object(params.clone()))
            .map_err(|e| StrategyError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(Self::new(config, trades))
    }
}

impl StrategyExecutor for RepeatExecutor {
    fn process_tick(&mut self, tick: &Tick) -> Result<(), ExecutorError> {
        if tick.symbol != self.config.symbol {
            return Ok(());
        }
        if tick.price <= Decimal::ZERO {
            return Err(ExecutorError::InvalidTickPrice(tick.price));
        }

        match self.current_trade.take() {
            None if tick.price <= self.config.entry_price => {
                let trade = self.trades.create_trade(&self.config.symbol, tick.price)?;
                debug!(trade_id = %trade.id, price = %tick.price, "entered position");
                self.current_trade = Some(trade);
                Ok(())
            }
            Some(trade) if tick.price >= self.config.exit_price => {
                if let Err(err) = self.trades.close_trade(&trade.id) {
                    warn!(trade_id = %trade.id, error = %err, "sell failed, clearing position");
                    return Err(err.into());
                }
                debug!(trade_id = %trade.id, price = %tick.price, "exited position");
                Ok(())
            }
            other => {
                self.current_trade = other;
                Ok(())
            }
        }
    }
}
