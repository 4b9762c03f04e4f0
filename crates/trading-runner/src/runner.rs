//! Per-strategy worker lifecycle.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use trading_core::error::{ExecutorError, StrategyError};
use trading_core::types::{Strategy, StrategyParams, StrategyStatus};
use trading_store::{StrategyStore, TradeStore};
use trading_strategies::StrategyRegistry;

use crate::feed::TickFeed;

/// Depth of each worker's error channel.
const ERROR_BUFFER: usize = 16;

struct WorkerHandle {
    /// Cancellation signal; the worker returns at its next await
    shutdown: watch::Sender<bool>,
    #[allow(dead_code)]
    worker: JoinHandle<()>,
    #[allow(dead_code)]
    drainer: JoinHandle<()>,
}

/// State shared with drainer tasks, which may stop a strategy on a
/// critical error while the runner itself is borrowed elsewhere.
struct Workers {
    jobs: Mutex<HashMap<String, WorkerHandle>>,
    strategies: Arc<StrategyStore>,
    feed: Arc<TickFeed>,
}

impl Workers {
    fn stop(&self, id: &str) -> Result<Strategy, StrategyError> {
        let handle = self.jobs.lock().remove(id);
        let Some(handle) = handle else {
            return Err(match self.strategies.by_id(id) {
                Ok(record) if record.status == StrategyStatus::Stopped => {
                    StrategyError::AlreadyStopped(id.to_string())
                }
                _ => StrategyError::NotFound(id.to_string()),
            });
        };

        let _ = handle.shutdown.send(true);
        self.feed.deregister(id);
        let record = self.strategies.stop_strategy(id)?;
        info!(strategy_id = %id, "strategy stopped");
        Ok(record)
    }
}

/// Owns one worker task per running strategy.
///
/// Workers consume ticks from the shared [`TickFeed`] and drive their
/// executor serially. Executor errors flow through a buffered channel to a
/// drainer task: recoverable errors are logged, critical errors stop the
/// strategy.
pub struct StrategyRunner {
    registry: Arc<StrategyRegistry>,
    trades: Arc<TradeStore>,
    workers: Arc<Workers>,
}

impl StrategyRunner {
    pub fn new(
        registry: Arc<StrategyRegistry>,
        strategies: Arc<StrategyStore>,
        trades: Arc<TradeStore>,
        feed: Arc<TickFeed>,
    ) -> Self {
        Self {
            registry,
            trades,
            workers: Arc::new(Workers {
                jobs: Mutex::new(HashMap::new()),
                strategies,
                feed,
            }),
        }
    }

    /// Start a new strategy instance.
    ///
    /// The executor is instantiated first so invalid parameters reject the
    /// start synchronously, before any record exists.
    pub fn start(&self, kind: &str, params: StrategyParams) -> Result<Strategy, StrategyError> {
        let mut executor = self
            .registry
            .create(kind, &params, Arc::clone(&self.trades))?;
        let record = self.workers.strategies.create_strategy(kind, params);
        let id = record.id.clone();

        let mut jobs = self.workers.jobs.lock();
        if jobs.contains_key(&id) {
            return Err(StrategyError::AlreadyRunning(id));
        }

        let mut tick_rx = self.workers.feed.register(&id);
        let (err_tx, mut err_rx) = mpsc::channel::<ExecutorError>(ERROR_BUFFER);
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let worker = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    maybe_tick = tick_rx.recv() => {
                        let Some(tick) = maybe_tick else { break };
                        if let Err(err) = executor.process_tick(&tick) {
                            let critical = err.is_critical();
                            if err_tx.send(err).await.is_err() {
                                break;
                            }
                            if critical {
                                break;
                            }
                        }
                    }
                }
            }
        });

        let workers = Arc::clone(&self.workers);
        let drain_id = id.clone();
        let drainer = tokio::spawn(async move {
            while let Some(err) = err_rx.recv().await {
                if err.is_critical() {
                    error!(strategy_id = %drain_id, error = %err, "critical strategy error, stopping");
                    if let Err(stop_err) = workers.stop(&drain_id) {
                        warn!(strategy_id = %drain_id, error = %stop_err, "self-stop failed");
                    }
                    break;
                }
                warn!(strategy_id = %drain_id, error = %err, "strategy error");
            }
        });

        jobs.insert(
            id.clone(),
            WorkerHandle {
                shutdown: shutdown_tx,
                worker,
                drainer,
            },
        );
        info!(strategy_id = %id, kind, "strategy started");
        Ok(record)
    }

    /// Stop a running strategy.
    ///
    /// Signals the worker, detaches its tick queue, and moves the store
    /// record to history. The worker exits at its next await; there is no
    /// forced termination.
    pub fn stop(&self, id: &str) -> Result<Strategy, StrategyError> {
        self.workers.stop(id)
    }

    /// Whether a worker exists for the given id.
    pub fn is_running(&self, id: &str) -> bool {
        self.workers.jobs.lock().contains_key(id)
    }

    /// Stop every running strategy. Used at shutdown.
    pub fn stop_all(&self) {
        let ids: Vec<String> = self.workers.jobs.lock().keys().cloned().collect();
        for id in ids {
            if let Err(err) = self.stop(&id) {
                warn!(strategy_id = %id, error = %err, "stop during shutdown failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use std::time::Duration;
    use trading_core::error::DataError;
    use trading_core::traits::TickSource;
    use trading_core::types::Tick;

    /// Emits a constant price for one symbol.
    struct ConstSource;

    impl TickSource for ConstSource {
        fn next_tick(&self) -> Result<Tick, DataError> {
            Ok(Tick::new("AAPL", dec!(100), Decimal::ONE))
        }
    }

    fn martingale_params() -> StrategyParams {
        let serde_json::Value::Object(map) = json!({
            "symbol": "AAPL",
            "base_position": 100.0,
            "take_profit": 1.0,
            "max_positions": 3
        }) else {
            unreachable!()
        };
        map
    }

    fn build_runner() -> (StrategyRunner, Arc<TradeStore>, Arc<StrategyStore>) {
        let trades = Arc::new(TradeStore::new());
        let strategies = Arc::new(StrategyStore::new());
        let feed = Arc::new(TickFeed::new(
            Arc::new(ConstSource),
            Duration::from_millis(5),
        ));
        feed.start();
        let runner = StrategyRunner::new(
            Arc::new(StrategyRegistry::new()),
            Arc::clone(&strategies),
            Arc::clone(&trades),
            feed,
        );
        (runner, trades, strategies)
    }

    #[tokio::test]
    async fn test_start_runs_worker_against_ticks() {
        let (runner, trades, strategies) = build_runner();

        let record = runner.start("martingale", martingale_params()).unwrap();
        assert!(runner.is_running(&record.id));
        assert_eq!(strategies.active().len(), 1);

        // The martingale enters on the first AAPL tick and then holds
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if trades.open_trades().len() == 1 {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("worker never opened a position");

        runner.stop(&record.id).unwrap();
    }

    #[tokio::test]
    async fn test_invalid_params_reject_start() {
        let (runner, _, strategies) = build_runner();

        let result = runner.start("martingale", StrategyParams::new());
        assert!(matches!(result, Err(StrategyError::InvalidConfig(_))));
        assert!(strategies.active().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_kind_rejects_start() {
        let (runner, _, _) = build_runner();

        let result = runner.start("nope", martingale_params());
        assert!(matches!(result, Err(StrategyError::UnknownKind(_))));
    }

    #[tokio::test]
    async fn test_stop_moves_record_to_history() {
        let (runner, _, strategies) = build_runner();
        let record = runner.start("martingale", martingale_params()).unwrap();

        let stopped = runner.stop(&record.id).unwrap();
        assert_eq!(stopped.status, StrategyStatus::Stopped);
        assert!(stopped.stop_time.is_some());
        assert!(!runner.is_running(&record.id));
        assert_eq!(strategies.history().len(), 1);
    }

    #[tokio::test]
    async fn test_second_stop_is_already_stopped() {
        let (runner, _, _) = build_runner();
        let record = runner.start("martingale", martingale_params()).unwrap();

        runner.stop(&record.id).unwrap();
        assert!(matches!(
            runner.stop(&record.id),
            Err(StrategyError::AlreadyStopped(_))
        ));
    }

    #[tokio::test]
    async fn test_stop_unknown_is_not_found() {
        let (runner, _, _) = build_runner();
        assert!(matches!(
            runner.stop("martingale-missing"),
            Err(StrategyError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_strategies_are_isolated() {
        let (runner, trades, _) = build_runner();

        let a = runner.start("martingale", martingale_params()).unwrap();
        let b = runner.start("martingale", martingale_params()).unwrap();

        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if trades.open_trades().len() == 2 {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("both workers should open one position each");

        runner.stop(&a.id).unwrap();
        runner.stop(&b.id).unwrap();
    }
}
