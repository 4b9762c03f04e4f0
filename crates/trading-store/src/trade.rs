//! Event-emitting trade store.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use rust_decimal::Decimal;
use tracing::info;

use trading_core::error::TradeError;
use trading_core::traits::TradeEventListener;
use trading_core::types::{Trade, TradeEvent, TradeEventKind};

/// How the store prices a closing trade.
///
/// Extension point: a market-feed pricer can be added here without touching
/// call sites.
#[derive(Debug, Clone)]
pub enum ExitPricing {
    /// Exit at `entry_price + offset`
    FixedOffset(Decimal),
}

impl Default for ExitPricing {
    fn default() -> Self {
        ExitPricing::FixedOffset(Decimal::ONE)
    }
}

impl ExitPricing {
    fn exit_price(&self, trade: &Trade) -> Decimal {
        match self {
            ExitPricing::FixedOffset(offset) => trade.entry_price + offset,
        }
    }
}

#[derive(Default)]
struct TradeBook {
    open: HashMap<String, Trade>,
    history: HashMap<String, Trade>,
    listeners: Vec<Arc<dyn TradeEventListener>>,
}

/// Authoritative mapping of trade id to trade record.
///
/// A trade is in exactly one of the open or history partitions. Closing a
/// trade moves it atomically; listeners observe `Created` before `Closed`
/// for any given id, in store commit order.
pub struct TradeStore {
    book: RwLock<TradeBook>,
    pricing: ExitPricing,
}

impl TradeStore {
    pub fn new() -> Self {
        Self::with_pricing(ExitPricing::default())
    }

    pub fn with_pricing(pricing: ExitPricing) -> Self {
        Self {
            book: RwLock::new(TradeBook::default()),
            pricing,
        }
    }

    /// Register a lifecycle event listener.
    pub fn add_listener(&self, listener: Arc<dyn TradeEventListener>) {
        self.book.write().listeners.push(listener);
    }

    /// Unregister a previously added listener (matched by identity).
    pub fn remove_listener(&self, listener: &Arc<dyn TradeEventListener>) {
        let mut book = self.book.write();
        book.listeners
            .retain(|existing| !Arc::ptr_eq(existing, listener));
    }

    /// Open a new trade and notify listeners with a `Created` event.
    pub fn create_trade(&self, symbol: &str, entry_price: Decimal) -> Result<Trade, TradeError> {
        if symbol.trim().is_empty() {
            return Err(TradeError::InvalidSymbol);
        }
        if entry_price <= Decimal::ZERO {
            return Err(TradeError::InvalidEntryPrice(entry_price));
        }

        let trade = Trade::open(symbol, entry_price);
        let listeners;
        {
            let mut book = self.book.write();
            book.open.insert(trade.id.clone(), trade.clone());
            listeners = book.listeners.clone();
        }
        info!(trade_id = %trade.id, symbol, "trade opened");

        // Listeners run outside the lock with a copied payload
        Self::notify(
            &listeners,
            TradeEvent {
                kind: TradeEventKind::Created,
                trade: trade.clone(),
            },
        );

        Ok(trade)
    }

    /// Close an open trade, move it to history, and notify listeners with a
    /// `Closed` event.
    ///
    /// Fails `NotFound` when the id is not in the open set, so a repeated
    /// close is rejected. `AlreadyClosed` guards the unreachable case of a
    /// closed record still sitting in the open partition.
    pub fn close_trade(&self, id: &str) -> Result<Trade, TradeError> {
        let (trade, listeners) = {
            let mut book = self.book.write();
            let Some(mut trade) = book.open.remove(id) else {
                return Err(TradeError::NotFound(id.to_string()));
            };
            if trade.is_closed() {
                book.open.insert(trade.id.clone(), trade);
                return Err(TradeError::AlreadyClosed(id.to_string()));
            }

            trade.close(self.pricing.exit_price(&trade));
            book.history.insert(trade.id.clone(), trade.clone());
            (trade, book.listeners.clone())
        };
        info!(trade_id = %trade.id, "trade closed");

        Self::notify(
            &listeners,
            TradeEvent {
                kind: TradeEventKind::Closed,
                trade: trade.clone(),
            },
        );

        Ok(trade)
    }

    /// Snapshot of all open trades.
    pub fn open_trades(&self) -> Vec<Trade> {
        self.book.read().open.values().cloned().collect()
    }

    /// Snapshot of all closed trades.
    pub fn trade_history(&self) -> Vec<Trade> {
        self.book.read().history.values().cloned().collect()
    }

    fn notify(listeners: &[Arc<dyn TradeEventListener>], event: TradeEvent) {
        for listener in listeners {
            listener.on_trade_event(&event);
        }
    }
}

impl Default for TradeStore {
    fn default() -> Self {
        Self::new()
    }
}
