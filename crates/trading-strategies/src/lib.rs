//! Trading strategy executors.
//!
//! Strategies are closed-set: the registry owns the kind-to-factory
//! dispatch and the discovery metadata for every kind.

mod martingale;
mod registry;
mod repeat;

pub use martingale::{MartingaleConfig, MartingaleExecutor};
pub use registry::StrategyRegistry;
pub use repeat::{RepeatConfig, RepeatExecutor};
