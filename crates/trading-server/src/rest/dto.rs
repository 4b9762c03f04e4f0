//! Request and response bodies.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use trading_core::types::{StrategyParams, StrategyStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyRequest {
    pub symbol: String,
    pub entry_price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellRequest {
    pub trade_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartStrategyRequest {
    pub kind: String,
    #[serde(default)]
    pub parameters: StrategyParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartStrategyResponse {
    pub id: String,
    pub start_time: DateTime<Utc>,
    pub status: StrategyStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopStrategyRequest {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopStrategyResponse {
    pub id: String,
    pub start_time: DateTime<Utc>,
    pub stop_time: DateTime<Utc>,
    pub status: StrategyStatus,
}

/// Error body shared by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}
