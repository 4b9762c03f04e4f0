//! Strategy executor trait.

use crate::error::ExecutorError;
use crate::types::Tick;

/// One running instance of a strategy kind.
///
/// Each executor is owned exclusively by its worker task, which feeds it
/// ticks strictly serially; implementations hold their state directly and
/// need no internal locking.
pub trait StrategyExecutor: Send {
    /// Process a single tick of market data.
    ///
    /// Recoverable errors are logged by the runner and the worker continues;
    /// errors with [`ExecutorError::is_critical`] terminate the worker.
    fn process_tick(&mut self, tick: &Tick) -> Result<(), ExecutorError>;
}
