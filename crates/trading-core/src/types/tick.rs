//! Market tick type.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One market data point. Ephemeral; ticks are never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tick {
    pub symbol: String,
    pub price: Decimal,
    pub volume: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl Tick {
    pub fn new(symbol: impl Into<String>, price: Decimal, volume: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            volume,
            timestamp: Utc::now(),
        }
    }
}
