//! Trade snapshot handlers.
//!
//! Both handlers listen to trade store lifecycle events and rebroadcast the
//! full contents of their partition to every subscriber.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Map, Value};

use trading_core::error::RegistryError;
use trading_core::traits::TradeEventListener;
use trading_core::types::{Trade, TradeEvent, TradeEventKind};
use trading_store::TradeStore;

use crate::hub::Hub;
use crate::message::{stream, Message};
use crate::registry::MessageHandler;

/// Streams the open-trade partition on every trade event.
pub struct OpenPositionsHandler {
    hub: Hub,
    store: Arc<TradeStore>,
    subs: Mutex<HashSet<String>>,
}

impl OpenPositionsHandler {
    pub fn new(hub: Hub, store: Arc<TradeStore>) -> Self {
        Self {
            hub,
            store,
            subs: Mutex::new(HashSet::new()),
        }
    }

    /// Emit one message per tracked subscription.
    pub fn broadcast_update(&self, trades: &[Trade]) {
        let subscribers: Vec<String> = self.subs.lock().iter().cloned().collect();
        for subscribe_id in subscribers {
            self.hub
                .broadcast(Message::stream(stream::OPEN_POSITIONS, &subscribe_id, &trades));
        }
    }
}

impl TradeEventListener for OpenPositionsHandler {
    fn on_trade_event(&self, _event: &TradeEvent) {
        self.broadcast_update(&self.store.open_trades());
    }
}

impl MessageHandler for OpenPositionsHandler {
    fn start(&self) {}
    fn stop(&self) {}

    fn handle_subscribe(
        &self,
        subscribe_id: &str,
        _options: &Map<String, Value>,
    ) -> Result<(), RegistryError> {
        self.subs.lock().insert(subscribe_id.to_string());
        self.hub.broadcast(Message::stream(
            stream::OPEN_POSITIONS,
            subscribe_id,
            &self.store.open_trades(),
        ));
        Ok(())
    }

    fn handle_unsubscribe(&self, subscribe_id: &str) -> Result<(), RegistryError> {
        self.subs.lock().remove(subscribe_id);
        Ok(())
    }
}

/// Streams the closed-trade partition; reacts to `Closed` events only.
pub struct TradeHistoryHandler {
    hub: Hub,
    store: Arc<TradeStore>,
    subs: Mutex<HashSet<String>>,
}

impl TradeHistoryHandler {
    pub fn new(hub: Hub, store: Arc<TradeStore>) -> Self {
        Self {
            hub,
            store,
            subs: Mutex::new(HashSet::new()),
        }
    }

    pub fn broadcast_update(&self, trades: &[Trade]) {
        let subscribers: Vec<String> = self.subs.lock().iter().cloned().collect();
        for subscribe_id in subscribers {
            self.hub
                .broadcast(Message::stream(stream::TRADE_HISTORY, &subscribe_id, &trades));
        }
    }
}

impl TradeEventListener for TradeHistoryHandler {
    fn on_trade_event(&self, event: &TradeEvent) {
        if event.kind != TradeEventKind::Closed {
            return;
        }
        self.broadcast_update(&self.store.trade_history());
    }
}

impl MessageHandler for TradeHistoryHandler {
    fn start(&self) {}
    fn stop(&self) {}

    fn handle_subscribe(
        &self,
        subscribe_id: &str,
        _options: &Map<String, Value>,
    ) -> Result<(), RegistryError> {
        self.subs.lock().insert(subscribe_id.to_string());
        self.hub.broadcast(Message::stream(
            stream::TRADE_HISTORY,
            subscribe_id,
            &self.store.trade_history(),
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
    use rust_decimal_macros::dec;
    use std::time::Duration;
    use tokio::sync::mpsc;

    async fn recv(rx: &mut mpsc::Receiver<Message>) -> Message {
        tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("timed out")
            .expect("channel closed")
    }

    fn subscribed_client(hub: &Hub, kind: &str, subscribe_id: &str) -> mpsc::Receiver<Message> {
        let handle = Arc::new(ClientHandle::new());
        let (tx, rx) = mpsc::channel(32);
        hub.register(Arc::clone(&handle), tx);
        handle.add_subscription(kind, subscribe_id);
        rx
    }

    #[tokio::test]
    async fn test_initial_snapshot_is_empty_array() {
        let hub = Hub::new();
        let store = Arc::new(TradeStore::new());
        let handler = OpenPositionsHandler::new(hub.clone(), store);
        let mut rx = subscribed_client(&hub, stream::OPEN_POSITIONS, "sub-1");

        handler.handle_subscribe("sub-1", &Map::new()).unwrap();

        let message = recv(&mut rx).await;
        assert_eq!(message.kind, "open_positions");
        assert_eq!(message.payload, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_trade_event_rebroadcasts_open_set() {
        let hub = Hub::new();
        let store = Arc::new(TradeStore::new());
        let handler = Arc::new(OpenPositionsHandler::new(hub.clone(), store.clone()));
        store.add_listener(handler.clone());

        let mut rx = subscribed_client(&hub, stream::OPEN_POSITIONS, "sub-1");
        handler.handle_subscribe("sub-1", &Map::new()).unwrap();
        recv(&mut rx).await; // initial empty snapshot

        let trade = store.create_trade("AAPL", dec!(150.25)).unwrap();
        let message = recv(&mut rx).await;
        assert_eq!(message.payload[0]["trade_id"], trade.id);
        assert_eq!(message.payload[0]["symbol"], "AAPL");

        store.close_trade(&trade.id).unwrap();
        let message = recv(&mut rx).await;
        assert_eq!(message.payload, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_history_ignores_created_events() {
        let hub = Hub::new();
        let store = Arc::new(TradeStore::new());
        let handler = Arc::new(TradeHistoryHandler::new(hub.clone(), store.clone()));
        store.add_listener(handler.clone());

        let mut rx = subscribed_client(&hub, stream::TRADE_HISTORY, "sub-1");
        handler.handle_subscribe("sub-1", &Map::new()).unwrap();
        recv(&mut rx).await; // initial empty snapshot

        let trade = store.create_trade("AAPL", dec!(150)).unwrap();
        // No broadcast for the Created event; the next message comes from
        // the close
        store.close_trade(&trade.id).unwrap();

        let message = recv(&mut rx).await;
        assert_eq!(message.kind, "trade_history");
        assert_eq!(message.payload[0]["trade_id"], trade.id);
        assert!(message.payload[0]["exit_time"].is_string());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unsubscribed_id_stops_receiving() {
        let hub = Hub::new();
        let store = Arc::new(TradeStore::new());
        let handler = OpenPositionsHandler::new(hub.clone(), store.clone());

        let mut rx = subscribed_client(&hub, stream::OPEN_POSITIONS, "sub-1");
        handler.handle_subscribe("sub-1", &Map::new()).unwrap();
        recv(&mut rx).await;

        handler.handle_unsubscribe("sub-1").unwrap();
        handler.broadcast_update(&store.open_trades());

        // Nothing further arrives for the dropped subscription
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
    }
}
