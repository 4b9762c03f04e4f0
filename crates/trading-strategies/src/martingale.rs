//! Martingale position-sizing strategy.
//!
//! Doubles the stake after each losing exit up to `max_positions`, then
//! resets to the base size. Take-profit exits always reset the cycle.

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use trading_core::error::{ExecutorError, StrategyError};
use trading_core::traits::StrategyExecutor;
use trading_core::types::{StrategyParams, Tick, Trade};
use trading_store::TradeStore;

/// Configuration for the Martingale strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MartingaleConfig {
    /// Symbol to trade; ticks for other symbols are ignored
    pub symbol: String,
    /// Initial position size in dollars
    pub base_position: Decimal,
    /// Take-profit threshold in percent above entry
    pub take_profit: Decimal,
    /// Maximum number of increasing positions before the cycle resets
    pub max_positions: u32,
}

impl MartingaleConfig {
    pub fn validate(&self) -> Result<(), StrategyError> {
        if self.symbol.trim().is_empty() {
            return Err(StrategyError::InvalidConfig(
                "symbol must not be empty".into(),
            ));
        }
        if self.base_position <= Decimal::ZERO {
            return Err(StrategyError::InvalidConfig(
                "base_position must be positive".into(),
            ));
        }
        if self.take_profit <= Decimal::ZERO {
            return Err(StrategyError::InvalidConfig(
                "take_profit must be positive".into(),
            ));
        }
        if self.max_positions < 1 || self.max_positions > 32 {
            return Err(StrategyError::InvalidConfig(
                "max_positions must be between 1 and 32".into(),
            ));
        }
        Ok(())
    }
}

/// Martingale strategy executor.
pub struct MartingaleExecutor {
    config: MartingaleConfig,
    trades: Arc<TradeStore>,
    current_trade: Option<Trade>,
    current_size: Decimal,
    position_count: u32,
}

impl MartingaleExecutor {
    pub fn new(config: MartingaleConfig, trades: Arc<TradeStore>) -> Self {
        let current_size = config.base_position;
        Self {
            config,
            trades,
            current_trade: None,
            current_size,
            position_count: 0,
        }
    }

    /// Build an executor from free-form parameters, validating them.
    pub fn from_params(
        params: &StrategyParams,
        trades: Arc<TradeStore>,
    ) -> Result<Self, StrategyError> {
        let config: MartingaleConfig =
            serde_json::from_value(serde_json::Value::Object(params.clone()))
                .map_err(|e| StrategyError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(Self::new(config, trades))
    }

    /// Current position size in dollars.
    pub fn current_size(&self) -> Decimal {
        self.current_size
    }

    /// Number of positions taken in the current cycle.
    pub fn position_count(&self) -> u32 {
        self.position_count
    }

    fn enter(&mut self, tick: &Tick) -> Result<(), ExecutorError> {
        let ceiling =
            self.config.base_position * Decimal::from(2u64.pow(self.config.max_positions));
        if self.current_size > ceiling {
            return Err(ExecutorError::CapacityExceeded {
                size: self.current_size,
                ceiling,
            });
        }

        let quantity = self.current_size / tick.price;
        if quantity <= Decimal::ZERO {
            return Err(ExecutorError::InvalidQuantity(tick.price));
        }

        let trade = self.trades.create_trade(&self.config.symbol, tick.price)?;
        self.position_count += 1;
        debug!(
            position = self.position_count,
            size = %self.current_size,
            quantity = %quantity,
            price = %tick.price,
            "opened position"
        );
        self.current_trade = Some(trade);
        Ok(())
    }

    fn manage(&mut self, trade: Trade, tick: &Tick) -> Result<(), ExecutorError> {
        if trade.entry_price <= Decimal::ZERO || trade.is_closed() {
            warn!(trade_id = %trade.id, "current trade is in an invalid state, resetting cycle");
            self.reset_cycle();
            return Ok(());
        }

        let target = trade.entry_price * (Decimal::ONE + self.config.take_profit / dec!(100));

        if tick.price >= target {
            if self.sell(&trade).is_err() {
                return Ok(());
            }
            let quantity = self.current_size / trade.entry_price;
            let profit = (tick.price - trade.entry_price) * quantity;
            info!(profit = %profit, "take profit, resetting cycle");
            self.reset_cycle();
        } else if tick.price < trade.entry_price {
            if self.sell(&trade).is_err() {
                return Ok(());
            }
            let quantity = self.current_size / trade.entry_price;
            let loss = (tick.price - trade.entry_price) * quantity;
            if self.position_count < self.config.max_positions {
                self.current_size *= dec!(2);
                info!(loss = %loss, size = %self.current_size, "loss, doubling position size");
            } else {
                self.current_size = self.config.base_position;
                self.position_count = 0;
                info!(loss = %loss, size = %self.current_size, "loss at max positions, resetting");
            }
        } else {
            // Hold between entry and target
            self.current_trade = Some(trade);
        }

        Ok(())
    }

    /// Close the current trade. A failed close means the trade is gone from
    /// the open set; the caller resets the cycle without a new sell attempt.
    fn sell(&mut self, trade: &Trade) -> Result<(), ExecutorError> {
        if let Err(err) = self.trades.close_trade(&trade.id) {
            warn!(trade_id = %trade.id, error = %err, "sell failed, resetting cycle");
            self.reset_cycle();
            return Err(err.into());
        }
        Ok(())
    }

    fn reset_cycle(&mut self) {
        self.current_trade = None;
        self.current_size = self.config.base_position;
        self.position_count = 0;
    }
}

impl StrategyExecutor for MartingaleExecutor {
    fn process_tick(&mut self, tick: &Tick) -> Result<(), ExecutorError> {
        if tick.symbol != self.config.symbol {
            return Ok(());
        }
        if tick.price <= Decimal::ZERO {
            return Err(ExecutorError::InvalidTickPrice(tick.price));
        }

        match self.current_trade.take() {
            None => self.enter(tick),
            Some(trade) => self.manage(trade, tick),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max_positions: u32) -> MartingaleConfig {
        MartingaleConfig {
            symbol: "AAPL".to_string(),
            base_position: dec!(100),
            take_profit: dec!(1),
            max_positions,
        }
    }

    fn tick(price: Decimal) -> Tick {
        Tick::new("AAPL", price, dec!(10))
    }

    #[test]
    fn test_config_validation() {
        assert!(config(3).validate().is_ok());

        let mut bad = config(3);
        bad.symbol = String::new();
        assert!(bad.validate().is_err());

        let mut bad = config(3);
        bad.base_position = Decimal::ZERO;
        assert!(bad.validate().is_err());

        assert!(config(0).validate().is_err());
        assert!(config(33).validate().is_err());
    }

    #[test]
    fn test_first_tick_enters() {
        let trades = Arc::new(TradeStore::new());
        let mut executor = MartingaleExecutor::new(config(3), trades.clone());

        executor.process_tick(&tick(dec!(100))).unwrap();

        assert_eq!(trades.open_trades().len(), 1);
        assert_eq!(executor.position_count(), 1);
        assert_eq!(executor.current_size(), dec!(100));
    }

    #[test]
    fn test_losses_double_then_reset() {
        let trades = Arc::new(TradeStore::new());
        let mut executor = MartingaleExecutor::new(config(3), trades.clone());

        // buy@100, sell@99, buy@99, sell@98, buy@98, sell@97 (max reached),
        // buy@97, sell@96
        let mut expected_sizes = Vec::new();
        for price in [
            dec!(100),
            dec!(99),
            dec!(98),
            dec!(97),
            dec!(96),
        ] {
            executor.process_tick(&tick(price)).unwrap();
            // Each losing tick also opens the next position
            executor.process_tick(&tick(price)).unwrap();
            expected_sizes.push(executor.current_size());
        }

        // Sizes after each loss cycle: 100 -> 200 -> 400 -> reset 100 -> 200
        assert_eq!(
            expected_sizes,
            vec![dec!(100), dec!(200), dec!(400), dec!(100), dec!(200)]
        );
        assert_eq!(trades.trade_history().len(), 4);
        assert_eq!(trades.open_trades().len(), 1);
    }

    #[test]
    fn test_take_profit_resets_cycle() {
        let trades = Arc::new(TradeStore::new());
        let mut executor = MartingaleExecutor::new(config(3), trades.clone());

        executor.process_tick(&tick(dec!(100))).unwrap();
        // Drop below entry to double the size
        executor.process_tick(&tick(dec!(99))).unwrap();
        executor.process_tick(&tick(dec!(99))).unwrap();
        assert_eq!(executor.current_size(), dec!(200));

        // Target is 99 * 1.01 = 99.99
        executor.process_tick(&tick(dec!(100))).unwrap();
        assert_eq!(executor.current_size(), dec!(100));
        assert_eq!(executor.position_count(), 0);
        assert!(trades.open_trades().is_empty());
    }

    #[test]
    fn test_hold_between_entry_and_target() {
        let trades = Arc::new(TradeStore::new());
        let mut executor = MartingaleExecutor::new(config(3), trades.clone());

        executor.process_tick(&tick(dec!(100))).unwrap();
        executor.process_tick(&tick(dec!(100.5))).unwrap();

        assert_eq!(trades.open_trades().len(), 1);
        assert!(trades.trade_history().is_empty());
        assert_eq!(executor.position_count(), 1);
    }

    #[test]
    fn test_max_positions_one_never_doubles() {
        let trades = Arc::new(TradeStore::new());
        let mut executor = MartingaleExecutor::new(config(1), trades.clone());

        for price in [dec!(100), dec!(99), dec!(98), dec!(97)] {
            executor.process_tick(&tick(price)).unwrap();
        }

        assert_eq!(executor.current_size(), dec!(100));
    }

    #[test]
    fn test_foreign_symbol_is_ignored() {
        let trades = Arc::new(TradeStore::new());
        let mut executor = MartingaleExecutor::new(config(3), trades.clone());

        let foreign = Tick::new("GOOGL", dec!(100), dec!(1));
        executor.process_tick(&foreign).unwrap();

        assert!(trades.open_trades().is_empty());
    }

    #[test]
    fn test_non_positive_price_is_recoverable_error() {
        let trades = Arc::new(TradeStore::new());
        let mut executor = MartingaleExecutor::new(config(3), trades);

        let result = executor.process_tick(&tick(dec!(0)));
        assert!(matches!(result, Err(ExecutorError::InvalidTickPrice(_))));
        assert!(!result.unwrap_err().is_critical());
    }

    #[test]
    fn test_externally_closed_trade_resets_without_sell() {
        let trades = Arc::new(TradeStore::new());
        let mut executor = MartingaleExecutor::new(config(3), trades.clone());

        executor.process_tick(&tick(dec!(100))).unwrap();
        let open = trades.open_trades();
        trades.close_trade(&open[0].id).unwrap();

        // Next losing tick finds the trade gone; the cycle resets cleanly
        executor.process_tick(&tick(dec!(99))).unwrap();
        assert_eq!(executor.position_count(), 0);
        assert_eq!(executor.current_size(), dec!(100));
        assert_eq!(trades.trade_history().len(), 1);
    }
}
