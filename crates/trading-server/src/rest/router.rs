//! Route table.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::app::AppState;
use crate::ws;

use super::handlers;

/// Create the REST + WebSocket router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/trades/buy", post(handlers::buy))
        .route("/api/trades/sell", post(handlers::sell))
        .route("/api/strategies/start", post(handlers::start_strategy))
        .route("/api/strategies/stop", post(handlers::stop_strategy))
        .route("/api/strategies/default", get(handlers::list_strategies))
        .route("/ws", get(ws::ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
