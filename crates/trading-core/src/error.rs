//! Error types for the trading server.
//!
//! Each enum covers one subsystem. Variants that cross the wire expose a
//! stable string code via `code()` which request handlers map onto HTTP
//! statuses and error bodies.

use rust_decimal::Decimal;
use thiserror::Error;

/// Trade store errors.
#[derive(Error, Debug)]
pub enum TradeError {
    #[error("Invalid trading symbol")]
    InvalidSymbol,

    #[error("Entry price must be positive, got {0}")]
    InvalidEntryPrice(Decimal),

    #[error("Trade not found: {0}")]
    NotFound(String),

    #[error("Trade already closed: {0}")]
    AlreadyClosed(String),
}

impl TradeError {
    /// Stable wire code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            TradeError::InvalidSymbol => "INVALID_SYMBOL",
            TradeError::InvalidEntryPrice(_) => "INVALID_ENTRY_PRICE",
            TradeError::NotFound(_) => "TRADE_NOT_FOUND",
            TradeError::AlreadyClosed(_) => "TRADE_ALREADY_CLOSED",
        }
    }
}

/// Strategy store, factory, and runner errors.
#[derive(Error, Debug)]
pub enum StrategyError {
    #[error("Invalid strategy parameters: {0}")]
    InvalidConfig(String),

    #[error("Unknown strategy kind: {0}")]
    UnknownKind(String),

    #[error("Strategy not found: {0}")]
    NotFound(String),

    #[error("Strategy already stopped: {0}")]
    AlreadyStopped(String),

    #[error("Strategy already running: {0}")]
    AlreadyRunning(String),
}

impl StrategyError {
    /// Stable wire code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            StrategyError::InvalidConfig(_) => "INVALID_STRATEGY",
            StrategyError::UnknownKind(_) => "UNKNOWN_STRATEGY_KIND",
            StrategyError::NotFound(_) => "STRATEGY_NOT_FOUND",
            StrategyError::AlreadyStopped(_) => "ALREADY_STOPPED",
            StrategyError::AlreadyRunning(_) => "ALREADY_RUNNING",
        }
    }
}

/// Errors surfaced by a strategy executor while processing ticks.
///
/// The runner logs recoverable errors and keeps the worker alive; a critical
/// error terminates the worker and stops the strategy.
#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("Invalid tick price: {0}")]
    InvalidTickPrice(Decimal),

    #[error("Computed quantity is not positive at price {0}")]
    InvalidQuantity(Decimal),

    #[error("Position size {size} exceeds ceiling {ceiling}")]
    CapacityExceeded { size: Decimal, ceiling: Decimal },

    #[error("Trade execution failed: {0}")]
    Trade(#[from] TradeError),
}

impl ExecutorError {
    /// Whether this error must terminate the owning worker.
    pub fn is_critical(&self) -> bool {
        matches!(self, ExecutorError::CapacityExceeded { .. })
    }
}

/// Message-type registry errors.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Handler for message type '{0}' already registered")]
    DuplicateType(String),

    #[error("No handler registered for message type '{0}'")]
    UnknownType(String),
}

/// Tick source errors.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("No symbols configured for tick generation")]
    NoSymbols,
}
