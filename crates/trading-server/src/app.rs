//! Application wiring.
//!
//! Builds every component in dependency order: tick source, hub, stores,
//! tick feed, runner, the five snapshot handlers, and the message-type
//! registry; then mounts the REST and WebSocket routes.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use trading_config::{AppConfig, ServerSettings};
use trading_core::traits::TickSource;
use trading_data::{SyntheticTickConfig, SyntheticTickSource};
use trading_runner::{StrategyRunner, TickFeed};
use trading_store::{StrategyStore, TradeStore};
use trading_strategies::StrategyRegistry;

use crate::handlers::{
    ActiveStrategiesHandler, OpenPositionsHandler, StrategyHistoryHandler, TickStreamHandler,
    TradeHistoryHandler,
};
use crate::hub::Hub;
use crate::message::stream;
use crate::registry::MessageTypeRegistry;
use crate::rest;

/// Shared state behind every request handler and session.
pub struct AppState {
    pub settings: ServerSettings,
    pub hub: Hub,
    pub trades: Arc<TradeStore>,
    pub strategies: Arc<StrategyStore>,
    pub registry: Arc<StrategyRegistry>,
    pub runner: Arc<StrategyRunner>,
    pub types: Arc<MessageTypeRegistry>,
    pub feed: Arc<TickFeed>,
    pub active_strategies: Arc<ActiveStrategiesHandler>,
    pub strategy_history: Arc<StrategyHistoryHandler>,
}

/// Build the full application. Must run inside a tokio runtime: the hub
/// loop, tick feed, and tick broadcaster are spawned here.
pub fn build(config: &AppConfig) -> anyhow::Result<(Router, Arc<AppState>)> {
    let tick_interval = Duration::from_millis(config.ticker.interval_ms);
    let mut tick_config = SyntheticTickConfig::new(
        config
            .ticker
            .symbols
            .iter()
            .map(|s| (s.symbol.clone(), s.start_price))
            .collect(),
    );
    tick_config.seed = config.ticker.seed;
    let source: Arc<dyn TickSource> = Arc::new(SyntheticTickSource::new(tick_config));

    let hub = Hub::new();
    let trades = Arc::new(TradeStore::new());
    let strategies = Arc::new(StrategyStore::new());
    let registry = Arc::new(StrategyRegistry::new());

    let feed = Arc::new(TickFeed::new(Arc::clone(&source), tick_interval));
    feed.start();
    let runner = Arc::new(StrategyRunner::new(
        Arc::clone(&registry),
        Arc::clone(&strategies),
        Arc::clone(&trades),
        Arc::clone(&feed),
    ));

    let ticks = Arc::new(TickStreamHandler::new(
        hub.clone(),
        Arc::clone(&source),
        tick_interval,
    ));
    let open_positions = Arc::new(OpenPositionsHandler::new(hub.clone(), Arc::clone(&trades)));
    let trade_history = Arc::new(TradeHistoryHandler::new(hub.clone(), Arc::clone(&trades)));
    let active_strategies = Arc::new(ActiveStrategiesHandler::new(
        hub.clone(),
        Arc::clone(&strategies),
    ));
    let strategy_history = Arc::new(StrategyHistoryHandler::new(
        hub.clone(),
        Arc::clone(&strategies),
    ));

    trades.add_listener(open_positions.clone());
    trades.add_listener(trade_history.clone());

    let mut types = MessageTypeRegistry::new();
    types.register(stream::TICKS, ticks)?;
    types.register(stream::OPEN_POSITIONS, open_positions)?;
    types.register(stream::TRADE_HISTORY, trade_history)?;
    types.register(stream::ACTIVE_STRATEGIES, active_strategies.clone())?;
    types.register(stream::STRATEGIES_HISTORY, strategy_history.clone())?;
    types.start_all();
    let types = Arc::new(types);

    let state = Arc::new(AppState {
        settings: config.server.clone(),
        hub,
        trades,
        strategies,
        registry,
        runner,
        types,
        feed,
        active_strategies,
        strategy_history,
    });

    let router = rest::create_router(Arc::clone(&state));
    Ok((router, state))
}

/// Run the server until ctrl-c, then shut components down.
pub async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let (router, state) = build(&config)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shutting down");
    state.types.stop_all();
    state.runner.stop_all();
    state.feed.stop();
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
