//! Subscription hub.
//!
//! One event loop multiplexes registrations, deregistrations, and outgoing
//! messages, so the client set is mutated from a single task and needs no
//! external lock. Each client has a bounded outbound queue; a full queue on
//! delivery evicts the client. Slow readers are dropped, never allowed to
//! block publishers.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::client::ClientHandle;
use crate::message::Message;

enum HubCommand {
    Register(Arc<ClientHandle>, mpsc::Sender<Message>),
    Unregister(Uuid),
    Broadcast(Message),
}

struct HubClient {
    handle: Arc<ClientHandle>,
    sender: mpsc::Sender<Message>,
}

/// Handle to the hub event loop. Cheap to clone.
#[derive(Clone)]
pub struct Hub {
    tx: mpsc::UnboundedSender<HubCommand>,
}

impl Hub {
    /// Create the hub and spawn its event loop.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_loop(rx));
        Self { tx }
    }

    /// Add a client to the active set.
    pub fn register(&self, client: Arc<ClientHandle>, sender: mpsc::Sender<Message>) {
        let _ = self.tx.send(HubCommand::Register(client, sender));
    }

    /// Remove a client and release its send side.
    pub fn unregister(&self, client_id: Uuid) {
        let _ = self.tx.send(HubCommand::Unregister(client_id));
    }

    /// Deliver a message to every client subscribed to its
    /// `(type, subscribe_id)`. Non-blocking; per-producer order is
    /// preserved.
    pub fn broadcast(&self, message: Message) {
        let _ = self.tx.send(HubCommand::Broadcast(message));
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_loop(mut rx: mpsc::UnboundedReceiver<HubCommand>) {
    let mut clients: HashMap<Uuid, HubClient> = HashMap::new();

    while let Some(command) = rx.recv().await {
        match command {
            HubCommand::Register(handle, sender) => {
                debug!(client_id = %handle.id(), "client registered");
                clients.insert(handle.id(), HubClient { handle, sender });
            }
            HubCommand::Unregister(client_id) => {
                if let Some(client) = clients.remove(&client_id) {
                    debug!(client_id = %client_id, "client unregistered");
                    client.handle.close();
                }
            }
            HubCommand::Broadcast(message) => {
                let mut evicted = Vec::new();
                for (client_id, client) in &clients {
                    if !client
                        .handle
                        .is_subscribed(&message.kind, &message.subscribe_id)
                    {
                        continue;
                    }
                    if client.sender.try_send(message.clone()).is_err() {
                        evicted.push(*client_id);
                    }
                }
                for client_id in evicted {
                    if let Some(client) = clients.remove(&client_id) {
                        warn!(client_id = %client_id, "outbound queue full, evicting client");
                        client.handle.close();
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::stream;
    use std::time::Duration;

    async fn recv(rx: &mut mpsc::Receiver<Message>) -> Message {
        tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("timed out")
            .expect("channel closed")
    }

    #[tokio::test]
    async fn test_broadcast_reaches_matching_subscription() {
        let hub = Hub::new();
        let handle = Arc::new(ClientHandle::new());
        let (tx, mut rx) = mpsc::channel(8);
        hub.register(Arc::clone(&handle), tx);
        handle.add_subscription(stream::TICKS, "sub-1");

        hub.broadcast(Message::stream(
            stream::TICKS,
            "sub-1",
            &serde_json::json!({"price": 1}),
        ));

        let message = recv(&mut rx).await;
        assert_eq!(message.kind, "ticks");
        assert_eq!(message.subscribe_id, "sub-1");
    }

    #[tokio::test]
    async fn test_non_matching_subscription_is_skipped() {
        let hub = Hub::new();
        let handle = Arc::new(ClientHandle::new());
        let (tx, mut rx) = mpsc::channel(8);
        hub.register(Arc::clone(&handle), tx);
        handle.add_subscription(stream::TICKS, "sub-1");

        // Same type, different subscription id
        hub.broadcast(Message::stream(stream::TICKS, "sub-2", &serde_json::json!({})));
        // Different type, same id
        hub.broadcast(Message::stream(
            stream::OPEN_POSITIONS,
            "sub-1",
            &serde_json::json!([]),
        ));
        // A matching one last, to prove the others were dropped
        hub.broadcast(Message::stream(stream::TICKS, "sub-1", &serde_json::json!({})));

        let message = recv(&mut rx).await;
        assert_eq!(message.subscribe_id, "sub-1");
        assert_eq!(message.kind, "ticks");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_full_queue_evicts_client() {
        let hub = Hub::new();
        let handle = Arc::new(ClientHandle::new());
        let (tx, _rx) = mpsc::channel(1);
        hub.register(Arc::clone(&handle), tx);
        handle.add_subscription(stream::TICKS, "sub-1");

        // First fills the queue, second overflows and evicts
        hub.broadcast(Message::stream(stream::TICKS, "sub-1", &serde_json::json!(1)));
        hub.broadcast(Message::stream(stream::TICKS, "sub-1", &serde_json::json!(2)));

        tokio::time::timeout(Duration::from_secs(1), handle.closed())
            .await
            .expect("evicted client should be closed");
    }

    #[tokio::test]
    async fn test_broadcast_without_subscribers_is_noop() {
        let hub = Hub::new();
        // No clients registered at all
        hub.broadcast(Message::stream(stream::TICKS, "sub-1", &serde_json::json!(1)));

        let handle = Arc::new(ClientHandle::new());
        let (tx, mut rx) = mpsc::channel(8);
        hub.register(Arc::clone(&handle), tx);
        handle.add_subscription(stream::TICKS, "sub-1");
        hub.broadcast(Message::stream(stream::TICKS, "sub-1", &serde_json::json!(2)));

        // Only the post-registration message arrives
        let message = recv(&mut rx).await;
        assert_eq!(message.payload, serde_json::json!(2));
    }
}
