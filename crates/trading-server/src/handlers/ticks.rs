//! Tick stream handler.
//!
//! Owns an interval task at the configured tick period. Every firing pulls
//! one value from the shared tick source and emits one message per
//! subscriber.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{Map, Value};
use tokio::sync::watch;
use tracing::warn;

use trading_core::error::RegistryError;
use trading_core::traits::TickSource;

use crate::hub::Hub;
use crate::message::{stream, Message};
use crate::registry::MessageHandler;

pub struct TickStreamHandler {
    hub: Hub,
    source: Arc<dyn TickSource>,
    interval: Duration,
    subs: Arc<Mutex<HashSet<String>>>,
    shutdown: Mutex<Option<watch::Sender<bool>>>,
}

impl TickStreamHandler {
    pub fn new(hub: Hub, source: Arc<dyn TickSource>, interval: Duration) -> Self {
        Self {
            hub,
            source,
            interval,
            subs: Arc::new(Mutex::new(HashSet::new())),
            shutdown: Mutex::new(None),
        }
    }
}

impl MessageHandler for TickStreamHandler {
    fn start(&self) {
        let mut guard = self.shutdown.lock();
        if guard.is_some() {
            return;
        }
        let (tx, mut rx) = watch::channel(false);
        *guard = Some(tx);

        let hub = self.hub.clone();
        let source = Arc::clone(&self.source);
        let subs = Arc::clone(&self.subs);
        let interval = self.interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = rx.changed() => break,
                    _ = ticker.tick() => {
                        let subscribers: Vec<String> = subs.lock().iter().cloned().collect();
                        if subscribers.is_empty() {
                            continue;
                        }
                        let tick = match source.next_tick() {
                            Ok(tick) => tick,
                            Err(err) => {
                                warn!(error = %err, "tick generation failed");
                                continue;
                            }
                        };
                        // One message per subscription
                        for subscribe_id in subscribers {
                            hub.broadcast(Message::stream(stream::TICKS, &subscribe_id, &tick));
                        }
                    }
                }
            }
        });
    }

    fn stop(&self) {
        if let Some(tx) = self.shutdown.lock().take() {
            let _ = tx.send(true);
        }
    }

    fn handle_subscribe(
        &self,
        subscribe_id: &str,
        _options: &Map<String, Value>,
    ) -> Result<(), RegistryError> {
        self.subs.lock().insert(subscribe_id.to_string());
        // First message is the current state: push one tick right away
        match self.source.next_tick() {
            Ok(tick) => self
                .hub
                .broadcast(Message::stream(stream::TICKS, subscribe_id, &tick)),
            Err(err) => warn!(error = %err, "initial tick generation failed"),
        }
        Ok(())
    }

    fn handle_unsubscribe(&self, subscribe_id: &str) -> Result<(), RegistryError> {
        self.subs.lock().remove(subscribe_id);
        Ok(())
    }
}
