//! Trade record and lifecycle events.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single long position from entry to exit.
///
/// A trade is open until `close` stamps the exit fields; from that point the
/// record is immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    /// Process-unique identifier, format `trade-<uuid>`
    #[serde(rename = "trade_id")]
    pub id: String,
    /// Trading symbol
    pub symbol: String,
    /// Price at entry
    pub entry_price: Decimal,
    /// Price at exit, set once on close
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_price: Option<Decimal>,
    /// Wall-clock instant of entry
    pub entry_time: DateTime<Utc>,
    /// Wall-clock instant of exit, set once on close
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_time: Option<DateTime<Utc>>,
}

impl Trade {
    /// Open a new trade with a freshly minted id and `entry_time = now`.
    pub fn open(symbol: impl Into<String>, entry_price: Decimal) -> Self {
        Self {
            id: format!("trade-{}", Uuid::new_v4()),
            symbol: symbol.into(),
            entry_price,
            exit_price: None,
            entry_time: Utc::now(),
            exit_time: None,
        }
    }

    /// Whether the exit fields have been stamped.
    pub fn is_closed(&self) -> bool {
        self.exit_time.is_some()
    }

    /// Stamp the exit fields. Only the store may call this, exactly once.
    pub fn close(&mut self, exit_price: Decimal) {
        self.exit_price = Some(exit_price);
        self.exit_time = Some(Utc::now());
    }
}

/// Kind of trade lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeEventKind {
    Created,
    Closed,
}

/// A trade lifecycle event carrying a defensive copy of the trade.
#[derive(Debug, Clone)]
pub struct TradeEvent {
    pub kind: TradeEventKind,
    pub trade: Trade,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_open_trade() {
        let trade = Trade::open("AAPL", dec!(150.25));

        assert!(trade.id.starts_with("trade-"));
        assert_eq!(trade.symbol, "AAPL");
        assert_eq!(trade.entry_price, dec!(150.25));
        assert!(!trade.is_closed());
        assert!(trade.exit_price.is_none());
    }

    #[test]
    fn test_close_stamps_exit_fields() {
        let mut trade = Trade::open("AAPL", dec!(150.25));
        trade.close(dec!(151.25));

        assert!(trade.is_closed());
        assert_eq!(trade.exit_price, Some(dec!(151.25)));
        assert!(trade.exit_time.is_some());
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Trade::open("AAPL", dec!(1));
        let b = Trade::open("AAPL", dec!(1));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_serde_omits_unset_exit_fields() {
        let trade = Trade::open("AAPL", dec!(150.25));
        let json = serde_json::to_value(&trade).unwrap();

        assert!(json.get("exit_price").is_none());
        assert!(json.get("exit_time").is_none());
        assert_eq!(json["trade_id"], trade.id);
    }
}
