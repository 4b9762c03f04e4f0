//! Wire message envelope and control payloads.
//!
//! Every frame on the duplex channel is a JSON object with a `type`, an
//! optional `subscribe_id`, and a `payload`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Control message types.
pub mod msg_type {
    pub const SUBSCRIBE: &str = "subscribe";
    pub const SUBSCRIBE_RESPONSE: &str = "subscribe_response";
    pub const UNSUBSCRIBE: &str = "unsubscribe";
    pub const UNSUBSCRIBE_RESPONSE: &str = "unsubscribe_response";
    pub const ERROR: &str = "error";
}

/// Broadcast stream types.
pub mod stream {
    pub const TICKS: &str = "ticks";
    pub const OPEN_POSITIONS: &str = "open_positions";
    pub const TRADE_HISTORY: &str = "trade_history";
    pub const ACTIVE_STRATEGIES: &str = "active_strategies";
    pub const STRATEGIES_HISTORY: &str = "strategies_history";
}

pub const STATUS_SUCCESS: &str = "success";

/// One frame on the duplex channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub kind: String,
    /// Addressee subscription; empty on control frames
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subscribe_id: String,
    #[serde(default)]
    pub payload: Value,
}

impl Message {
    /// Build a stream message addressed to one subscription.
    pub fn stream(kind: &str, subscribe_id: &str, payload: &impl Serialize) -> Self {
        Self {
            kind: kind.to_string(),
            subscribe_id: subscribe_id.to_string(),
            payload: serde_json::to_value(payload).unwrap_or(Value::Null),
        }
    }

    /// Build a control response frame.
    pub fn response(kind: &str, payload: &impl Serialize) -> Self {
        Self {
            kind: kind.to_string(),
            subscribe_id: String::new(),
            payload: serde_json::to_value(payload).unwrap_or(Value::Null),
        }
    }

    /// Build an error frame.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: msg_type::ERROR.to_string(),
            subscribe_id: String::new(),
            payload: serde_json::json!({ "error": message.into() }),
        }
    }
}

/// Client request to subscribe to a stream type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscribeRequest {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub options: serde_json::Map<String, Value>,
}

/// Server reply to a subscribe request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscribeResponse {
    pub subscribe_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Client request to drop a subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnsubscribeRequest {
    pub subscribe_id: String,
}

/// Server reply to an unsubscribe request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnsubscribeResponse {
    pub subscribe_id: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
