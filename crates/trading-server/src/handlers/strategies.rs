//! Strategy snapshot handlers.
//!
//! There is no store-level event bus for strategies; the request path calls
//! `broadcast_update` explicitly after every start or stop.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Map, Value};

use trading_core::error::RegistryError;
use trading_core::types::Strategy;
use trading_store::StrategyStore;

use crate::hub::Hub;
use crate::message::{stream, Message};
use crate::registry::MessageHandler;

/// Streams the active-strategy partition.
pub struct ActiveStrategiesHandler {
    hub: Hub,
    store: Arc<StrategyStore>,
    subs: Mutex<HashSet<String>>,
}

impl ActiveStrategiesHandler {
    pub fn new(hub: Hub, store: Arc<StrategyStore>) -> Self {
        Self {
            hub,
            store,
            subs: Mutex::new(HashSet::new()),
        }
    }

    /// Emit one message per tracked subscription.
    pub fn broadcast_update(&self, strategies: &[Strategy]) {
        let subscribers: Vec<String> = self.subs.lock().iter().cloned().collect();
        for subscribe_id in subscribers {
            self.hub.broadcast(Message::stream(
                stream::ACTIVE_STRATEGIES,
                &subscribe_id,
                &strategies,
            ));
        }
    }
}

impl MessageHandler for ActiveStrategiesHandler {
    fn start(&self) {}
    fn stop(&self) {}

    fn handle_subscribe(
        &self,
        subscribe_id: &str,
        _options: &Map<String, Value>,
    ) -> Result<(), RegistryError> {
        self.subs.lock().insert(subscribe_id.to_string());
        self.hub.broadcast(Message::stream(
            stream::ACTIVE_STRATEGIES,
            subscribe_id,
            &self.store.active(),
        ));
        Ok(())
    }

    fn handle_unsubscribe(&self, subscribe_id: &str) -> Result<(), RegistryError> {
        self.subs.lock().remove(subscribe_id);
        Ok(())
    }
}

/// Streams the stopped-strategy partition.
pub struct StrategyHistoryHandler {
    hub: Hub,
    store: Arc<StrategyStore>,
    subs: Mutex<HashSet<String>>,
}

impl StrategyHistoryHandler {
    pub fn new(hub: Hub, store: Arc<StrategyStore>) -> Self {
        Self {
            hub,
            store,
            subs: Mutex::new(HashSet::new()),
        }
    }

    pub fn broadcast_update(&self, strategies: &[Strategy]) {
        let subscribers: Vec<String> = self.subs.lock().iter().cloned().collect();
        for subscribe_id in subscribers {
            self.hub.broadcast(Message::stream(
                stream::STRATEGIES_HISTORY,
                &subscribe_id,
                &strategies,
            ));
        }
    }
}

impl MessageHandler for StrategyHistoryHandler {
    fn start(&self) {}
    fn stop(&self) {}

    fn handle_subscribe(
        &self,
        subscribe_id: &str,
        _options: &Map<String, Value>,
    ) -> Result<(), RegistryError> {
        self.subs.lock().insert(subscribe_id.to_string());
        self.hub.broadcast(Message::stream(
            stream::STRATEGIES_HISTORY,
            subscribe_id,
            &self.store.history(),
        ));
        Ok(())
    }

    fn handle_unsubscribe(&self, subscribe_id: &str) -> Result<(), RegistryError> {
        self.subs.lock().remove(subscribe_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientHandle;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use trading_core::types::StrategyParams;

    async fn recv(rx: &mut mpsc::Receiver<Message>) -> Message {
        tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("timed out")
            .expect("channel closed")
    }

    #[tokio::test]
    async fn test_subscribe_then_update_cycle() {
        let hub = Hub::new();
        let store = Arc::new(StrategyStore::new());
        let active = ActiveStrategiesHandler::new(hub.clone(), store.clone());
        let history = StrategyHistoryHandler::new(hub.clone(), store.clone());

        let handle = Arc::new(ClientHandle::new());
        let (tx, mut rx) = mpsc::channel(32);
        hub.register(Arc::clone(&handle), tx);
        handle.add_subscription(stream::ACTIVE_STRATEGIES, "sub-a");
        handle.add_subscription(stream::STRATEGIES_HISTORY, "sub-h");

        active.handle_subscribe("sub-a", &Map::new()).unwrap();
        assert_eq!(recv(&mut rx).await.payload, serde_json::json!([]));
        history.handle_subscribe("sub-h", &Map::new()).unwrap();
        assert_eq!(recv(&mut rx).await.payload, serde_json::json!([]));

        // Start: request path broadcasts the active set
        let record = store.create_strategy("martingale", StrategyParams::new());
        active.broadcast_update(&store.active());
        let message = recv(&mut rx).await;
        assert_eq!(message.kind, "active_strategies");
        assert_eq!(message.payload[0]["id"], record.id);

        // Stop: request path broadcasts both partitions
        store.stop_strategy(&record.id).unwrap();
        active.broadcast_update(&store.active());
        history.broadcast_update(&store.history());

        let message = recv(&mut rx).await;
        assert_eq!(message.kind, "active_strategies");
        assert_eq!(message.payload, serde_json::json!([]));
        let message = recv(&mut rx).await;
        assert_eq!(message.kind, "strategies_history");
        assert_eq!(message.payload[0]["status"], "stopped");
    }
}
