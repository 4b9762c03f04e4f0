//! Tick source trait.

use crate::error::DataError;
use crate::types::Tick;

/// Produces market ticks on demand.
///
/// Implementations are shared between the tick stream handler and the
/// strategy tick feed, so they must be internally synchronized.
pub trait TickSource: Send + Sync {
    /// Produce the next tick.
    fn next_tick(&self) -> Result<Tick, DataError>;
}
