//! Strategy runtime.
//!
//! One worker task per active strategy, all fed by a single tick
//! multiplexer that owns the tick source cadence.

mod feed;
mod runner;

pub use feed::TickFeed;
pub use runner::StrategyRunner;
