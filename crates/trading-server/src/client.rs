//! WebSocket client session.
//!
//! Each connection runs a read task (this module's session loop) and a
//! write task. The session owns the per-client subscription table that the
//! hub's matching predicate consults.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::{self, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::sync::{mpsc, Notify};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::message::{
    msg_type, Message, SubscribeRequest, SubscribeResponse, UnsubscribeRequest,
    UnsubscribeResponse, STATUS_SUCCESS,
};

#[derive(Default)]
struct SubscriptionTable {
    /// subscribe_id -> stream type
    kinds_by_id: HashMap<String, String>,
    /// stream type -> subscribe_ids, the index `is_subscribed` consults
    ids_by_kind: HashMap<String, HashSet<String>>,
}

/// Routing handle for one connected client.
///
/// The hub holds this to match broadcasts against the client's
/// subscriptions and to signal eviction; the session holds it to mutate the
/// table. Dropping a subscription entry here never happens implicitly; the
/// session removes entries on unsubscribe and drains them on disconnect.
pub struct ClientHandle {
    id: Uuid,
    subscriptions: Mutex<SubscriptionTable>,
    closed: Notify,
}

impl ClientHandle {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            subscriptions: Mutex::new(SubscriptionTable::default()),
            closed: Notify::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// True iff the table holds `subscribe_id` under `kind`.
    pub fn is_subscribed(&self, kind: &str, subscribe_id: &str) -> bool {
        self.subscriptions
            .lock()
            .ids_by_kind
            .get(kind)
            .is_some_and(|ids| ids.contains(subscribe_id))
    }

    pub fn add_subscription(&self, kind: &str, subscribe_id: &str) {
        let mut table = self.subscriptions.lock();
        table
            .kinds_by_id
            .insert(subscribe_id.to_string(), kind.to_string());
        table
            .ids_by_kind
            .entry(kind.to_string())
            .or_default()
            .insert(subscribe_id.to_string());
    }

    /// Stream type a subscription id belongs to, if any.
    pub fn subscription_kind(&self, subscribe_id: &str) -> Option<String> {
        self.subscriptions
            .lock()
            .kinds_by_id
            .get(subscribe_id)
            .cloned()
    }

    /// Remove one subscription, returning its stream type.
    pub fn remove_subscription(&self, subscribe_id: &str) -> Option<String> {
        let mut table = self.subscriptions.lock();
        let kind = table.kinds_by_id.remove(subscribe_id)?;
        if let Some(ids) = table.ids_by_kind.get_mut(&kind) {
            ids.remove(subscribe_id);
            if ids.is_empty() {
                table.ids_by_kind.remove(&kind);
            }
        }
        Some(kind)
    }

    /// Take every `(kind, subscribe_id)` pair, emptying the table.
    pub fn drain_subscriptions(&self) -> Vec<(String, String)> {
        let mut table = self.subscriptions.lock();
        table.ids_by_kind.clear();
        table
            .kinds_by_id
            .drain()
            .map(|(id, kind)| (kind, id))
            .collect()
    }

    /// Signal the write task to shut the connection down.
    pub fn close(&self) {
        self.closed.notify_one();
    }

    /// Resolves once the client has been closed or evicted.
    pub async fn closed(&self) {
        self.closed.notified().await;
    }
}

impl Default for ClientHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Drive one WebSocket connection to completion.
pub async fn run_session(socket: WebSocket, state: Arc<AppState>) {
    let (ws_tx, ws_rx) = socket.split();
    let (out_tx, out_rx) = mpsc::channel::<Message>(state.settings.client_buffer);
    let handle = Arc::new(ClientHandle::new());

    state.hub.register(Arc::clone(&handle), out_tx.clone());
    debug!(client_id = %handle.id(), "session opened");

    let writer = tokio::spawn(write_pump(
        ws_tx,
        out_rx,
        Arc::clone(&handle),
        Duration::from_secs(state.settings.ping_interval_secs),
        Duration::from_secs(state.settings.write_timeout_secs),
    ));

    read_pump(ws_rx, &handle, &state, &out_tx).await;

    // Free handler-side subscription state before leaving the hub
    for (kind, subscribe_id) in handle.drain_subscriptions() {
        if let Err(err) = state.types.handle_unsubscribe(&kind, &subscribe_id) {
            warn!(client_id = %handle.id(), error = %err, "teardown unsubscribe failed");
        }
    }
    state.hub.unregister(handle.id());
    handle.close();
    let _ = writer.await;
    debug!(client_id = %handle.id(), "session closed");
}

/// Read side: parse control frames until the peer disappears or goes
/// silent past the read deadline.
async fn read_pump(
    mut ws_rx: SplitStream<WebSocket>,
    handle: &Arc<ClientHandle>,
    state: &Arc<AppState>,
    out_tx: &mpsc::Sender<Message>,
) {
    let read_timeout = Duration::from_secs(state.settings.read_timeout_secs);

    loop {
        let frame = match tokio::time::timeout(read_timeout, ws_rx.next()).await {
            Err(_) => {
                debug!(client_id = %handle.id(), "read deadline expired");
                return;
            }
            Ok(None) | Ok(Some(Err(_))) => return,
            Ok(Some(Ok(frame))) => frame,
        };

        match frame {
            ws::Message::Text(text) => match serde_json::from_str::<Message>(&text) {
                Ok(message) => handle_control(&message, handle, state, out_tx).await,
                Err(_) => {
                    let _ = out_tx.send(Message::error("Invalid message format")).await;
                }
            },
            ws::Message::Close(_) => return,
            // Pings and pongs just refresh the read deadline
            _ => {}
        }
    }
}

async fn handle_control(
    message: &Message,
    handle: &Arc<ClientHandle>,
    state: &Arc<AppState>,
    out_tx: &mpsc::Sender<Message>,
) {
    match message.kind.as_str() {
        msg_type::SUBSCRIBE => {
            let request: SubscribeRequest = match serde_json::from_value(message.payload.clone()) {
                Ok(request) => request,
                Err(_) => {
                    let _ = out_tx
                        .send(Message::error("Invalid subscribe request format"))
                        .await;
                    return;
                }
            };

            let subscribe_id = Uuid::new_v4().to_string();
            // Record the subscription before delegating so the handler's
            // immediate snapshot already matches in the hub
            handle.add_subscription(&request.kind, &subscribe_id);
            if let Err(err) =
                state
                    .types
                    .handle_subscribe(&request.kind, &subscribe_id, &request.options)
            {
                handle.remove_subscription(&subscribe_id);
                let _ = out_tx
                    .send(Message::error(format!("Subscription failed: {err}")))
                    .await;
                return;
            }

            let _ = out_tx
                .send(Message::response(
                    msg_type::SUBSCRIBE_RESPONSE,
                    &SubscribeResponse {
                        subscribe_id,
                        kind: request.kind,
                        status: STATUS_SUCCESS.to_string(),
                        error: None,
                    },
                ))
                .await;
        }

        msg_type::UNSUBSCRIBE => {
            let request: UnsubscribeRequest = match serde_json::from_value(message.payload.clone())
            {
                Ok(request) => request,
                Err(_) => {
                    let _ = out_tx
                        .send(Message::error("Invalid unsubscribe request format"))
                        .await;
                    return;
                }
            };

            let Some(kind) = handle.subscription_kind(&request.subscribe_id) else {
                let _ = out_tx.send(Message::error("Invalid subscription ID")).await;
                return;
            };
            if let Err(err) = state.types.handle_unsubscribe(&kind, &request.subscribe_id) {
                let _ = out_tx
                    .send(Message::error(format!("Unsubscribe failed: {err}")))
                    .await;
                return;
            }
            handle.remove_subscription(&request.subscribe_id);

            let _ = out_tx
                .send(Message::response(
                    msg_type::UNSUBSCRIBE_RESPONSE,
                    &UnsubscribeResponse {
                        subscribe_id: request.subscribe_id,
                        status: STATUS_SUCCESS.to_string(),
                        error: None,
                    },
                ))
                .await;
        }

        _ => {
            let _ = out_tx.send(Message::error("Unknown message type")).await;
        }
    }
}

/// Write side: forward queued messages and keep the peer alive with pings.
async fn write_pump(
    mut ws_tx: SplitSink<WebSocket, ws::Message>,
    mut out_rx: mpsc::Receiver<Message>,
    handle: Arc<ClientHandle>,
    ping_interval: Duration,
    write_timeout: Duration,
) {
    let mut ping = tokio::time::interval(ping_interval);

    loop {
        tokio::select! {
            _ = handle.closed() => break,
            maybe = out_rx.recv() => {
                let Some(message) = maybe else { break };
                let Ok(json) = serde_json::to_string(&message) else { continue };
                match tokio::time::timeout(write_timeout, ws_tx.send(ws::Message::Text(json.into()))).await {
                    Ok(Ok(())) => {}
                    // Write failure or deadline terminates the session
                    _ => break,
                }
            }
            _ = ping.tick() => {
                match tokio::time::timeout(write_timeout, ws_tx.send(ws::Message::Ping(Bytes::new()))).await {
                    Ok(Ok(())) => {}
                    _ => break,
                }
            }
        }
    }

    let _ = ws_tx.close().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_table_round_trip() {
        let handle = ClientHandle::new();
        handle.add_subscription("ticks", "sub-1");

        assert!(handle.is_subscribed("ticks", "sub-1"));
        assert!(!handle.is_subscribed("ticks", "sub-2"));
        assert!(!handle.is_subscribed("open_positions", "sub-1"));
        assert_eq!(handle.subscription_kind("sub-1").as_deref(), Some("ticks"));

        assert_eq!(handle.remove_subscription("sub-1").as_deref(), Some("ticks"));
        assert!(!handle.is_subscribed("ticks", "sub-1"));
        assert!(handle.remove_subscription("sub-1").is_none());
    }

    #[test]
    fn test_drain_empties_table() {
        let handle = ClientHandle::new();
        handle.add_subscription("ticks", "sub-1");
        handle.add_subscription("open_positions", "sub-2");

        let mut drained = handle.drain_subscriptions();
        drained.sort();
        assert_eq!(
            drained,
            vec![
                ("open_positions".to_string(), "sub-2".to_string()),
                ("ticks".to_string(), "sub-1".to_string()),
            ]
        );
        assert!(!handle.is_subscribed("ticks", "sub-1"));
    }

    #[tokio::test]
    async fn test_close_resolves_waiter() {
        let handle = Arc::new(ClientHandle::new());
        let waiter = {
            let handle = Arc::clone(&handle);
            tokio::spawn(async move { handle.closed().await })
        };
        handle.close();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("close should resolve the waiter")
            .unwrap();
    }
}
