//! REST handlers.
//!
//! Thin adapters: translate request bodies into store and runner calls,
//! push strategy snapshot rebroadcasts after each mutation, and map domain
//! errors onto the wire.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use trading_core::types::{StrategyMetadata, Trade};

use crate::app::AppState;

use super::dto::{
    BuyRequest, SellRequest, StartStrategyRequest, StartStrategyResponse, StopStrategyRequest,
    StopStrategyResponse,
};
use super::error::ApiError;

/// POST /api/trades/buy
pub async fn buy(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BuyRequest>,
) -> Result<Json<Trade>, ApiError> {
    let trade = state.trades.create_trade(&request.symbol, request.entry_price)?;
    Ok(Json(trade))
}

/// POST /api/trades/sell
pub async fn sell(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SellRequest>,
) -> Result<Json<Trade>, ApiError> {
    let trade = state.trades.close_trade(&request.trade_id)?;
    Ok(Json(trade))
}

/// POST /api/strategies/start
pub async fn start_strategy(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StartStrategyRequest>,
) -> Result<Json<StartStrategyResponse>, ApiError> {
    let record = state.runner.start(&request.kind, request.parameters)?;
    state
        .active_strategies
        .broadcast_update(&state.strategies.active());

    Ok(Json(StartStrategyResponse {
        id: record.id,
        start_time: record.start_time,
        status: record.status,
    }))
}

/// POST /api/strategies/stop
pub async fn stop_strategy(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StopStrategyRequest>,
) -> Result<Json<StopStrategyResponse>, ApiError> {
    let record = state.runner.stop(&request.id)?;
    state
        .active_strategies
        .broadcast_update(&state.strategies.active());
    state
        .strategy_history
        .broadcast_update(&state.strategies.history());

    let stop_time = record
        .stop_time
        .ok_or_else(|| ApiError::internal("stopped strategy has no stop_time"))?;
    Ok(Json(StopStrategyResponse {
        id: record.id,
        start_time: record.start_time,
        stop_time,
        status: record.status,
    }))
}

/// GET /api/strategies/default
pub async fn list_strategies(State(state): State<Arc<AppState>>) -> Json<Vec<StrategyMetadata>> {
    Json(state.registry.list().into_iter().cloned().collect())
}
