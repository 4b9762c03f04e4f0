//! Tick fan-out.
//!
//! A single task owns the tick source cadence and forwards each generated
//! tick to every registered worker queue. Queues are bounded; a lagging
//! worker loses ticks rather than blocking the feed or other workers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use trading_core::traits::TickSource;
use trading_core::types::Tick;

/// Depth of each worker's tick queue.
const TAP_BUFFER: usize = 64;

/// Multiplexes one tick source to any number of worker queues.
pub struct TickFeed {
    source: Arc<dyn TickSource>,
    interval: Duration,
    taps: Arc<Mutex<HashMap<String, mpsc::Sender<Tick>>>>,
    shutdown: Mutex<Option<watch::Sender<bool>>>,
}

impl TickFeed {
    pub fn new(source: Arc<dyn TickSource>, interval: Duration) -> Self {
        Self {
            source,
            interval,
            taps: Arc::new(Mutex::new(HashMap::new())),
            shutdown: Mutex::new(None),
        }
    }

    /// Start the generation task. Idempotent.
    pub fn start(&self) {
        let mut guard = self.shutdown.lock();
        if guard.is_some() {
            return;
        }
        let (tx, mut rx) = watch::channel(false);
        *guard = Some(tx);

        let source = Arc::clone(&self.source);
        let taps = Arc::clone(&self.taps);
        let interval = self.interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = rx.changed() => break,
                    _ = ticker.tick() => {
                        let tick = match source.next_tick() {
                            Ok(tick) => tick,
                            Err(err) => {
                                warn!(error = %err, "tick generation failed");
                                continue;
                            }
                        };
                        for (id, tap) in taps.lock().iter() {
                            if tap.try_send(tick.clone()).is_err() {
                                // Full or closed; the worker catches up or
                                // is being torn down
                                debug!(strategy_id = %id, "dropping tick for lagging worker");
                            }
                        }
                    }
                }
            }
        });
    }

    /// Stop the generation task. Idempotent.
    pub fn stop(&self) {
        if let Some(tx) = self.shutdown.lock().take() {
            let _ = tx.send(true);
        }
    }

    /// Register a worker queue and return its receiving end.
    pub fn register(&self, strategy_id: &str) -> mpsc::Receiver<Tick> {
        let (tx, rx) = mpsc::channel(TAP_BUFFER);
        self.taps.lock().insert(strategy_id.to_string(), tx);
        rx
    }

    /// Drop a worker queue. The worker's receiver sees the channel close.
    pub fn deregister(&self, strategy_id: &str) {
        self.taps.lock().remove(strategy_id);
    }

    /// Number of registered worker queues.
    pub fn tap_count(&self) -> usize {
        self.taps.lock().len()
    }
}
