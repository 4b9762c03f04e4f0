//! Core data types for the trading server.

mod metadata;
mod strategy;
mod tick;
mod trade;

pub use metadata::{ParameterInfo, StrategyMetadata};
pub use strategy::{Strategy, StrategyParams, StrategyStatus};
pub use tick::Tick;
pub use trade::{Trade, TradeEvent, TradeEventKind};
