//! Strategy instance store.

use std::collections::HashMap;

use parking_lot::RwLock;

use trading_core::error::StrategyError;
use trading_core::types::{Strategy, StrategyParams};

#[derive(Default)]
struct StrategyBook {
    active: HashMap<String, Strategy>,
    history: HashMap<String, Strategy>,
}

/// Authoritative mapping of strategy id to strategy record.
///
/// Unlike the trade store there is no event bus here; the request path
/// rebroadcasts snapshots explicitly after each mutation.
pub struct StrategyStore {
    book: RwLock<StrategyBook>,
}

impl StrategyStore {
    pub fn new() -> Self {
        Self {
            book: RwLock::new(StrategyBook::default()),
        }
    }

    /// Create a new active strategy record.
    pub fn create_strategy(&self, kind: &str, parameters: StrategyParams) -> Strategy {
        let strategy = Strategy::activate(kind, parameters);
        self.book
            .write()
            .active
            .insert(strategy.id.clone(), strategy.clone());
        strategy
    }

    /// Stop an active strategy and move it to history.
    ///
    /// A second stop of the same id fails `AlreadyStopped`.
    pub fn stop_strategy(&self, id: &str) -> Result<Strategy, StrategyError> {
        let mut book = self.book.write();

        if book.history.contains_key(id) {
            return Err(StrategyError::AlreadyStopped(id.to_string()));
        }
        let mut strategy = book
            .active
            .remove(id)
            .ok_or_else(|| StrategyError::NotFound(id.to_string()))?;

        strategy.stop();
        book.history.insert(strategy.id.clone(), strategy.clone());
        Ok(strategy)
    }

    /// Snapshot of all active strategies.
    pub fn active(&self) -> Vec<Strategy> {
        self.book.read().active.values().cloned().collect()
    }

    /// Snapshot of all stopped strategies.
    pub fn history(&self) -> Vec<Strategy> {
        self.book.read().history.values().cloned().collect()
    }

    /// Look up a strategy in either partition.
    pub fn by_id(&self, id: &str) -> Result<Strategy, StrategyError> {
        let book = self.book.read();
        book.active
            .get(id)
            .or_else(|| book.history.get(id))
            .cloned()
            .ok_or_else(|| StrategyError::NotFound(id.to_string()))
    }
}

impl Default for StrategyStore {
    fn default() -> Self {
        Self::new()
    }
}
