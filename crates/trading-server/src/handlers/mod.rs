//! Per-type snapshot handlers.

mod strategies;
mod ticks;
mod trades;

pub use strategies::{ActiveStrategiesHandler, StrategyHistoryHandler};
pub use ticks::TickStreamHandler;
pub use trades::{OpenPositionsHandler, TradeHistoryHandler};
