//! Trade event observer trait.

use crate::types::TradeEvent;

/// Observer for trade lifecycle events.
///
/// Listeners are invoked synchronously on the mutating task, after the store
/// has released its lock, with a defensive copy of the trade. Listeners must
/// not re-enter the emitting store's write path.
pub trait TradeEventListener: Send + Sync {
    fn on_trade_event(&self, event: &TradeEvent);
}
