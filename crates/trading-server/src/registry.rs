//! Message-type registry.
//!
//! Maps each broadcast type name to the handler that tracks its
//! subscriptions and originates its updates. Registration happens once at
//! startup; afterwards the registry is shared read-only.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use trading_core::error::RegistryError;

/// Per-type subscription handler.
///
/// `start`/`stop` are idempotent lifecycle hooks. `handle_subscribe` must
/// record the subscription and immediately push one full snapshot addressed
/// to it.
pub trait MessageHandler: Send + Sync {
    fn start(&self);
    fn stop(&self);
    fn handle_subscribe(
        &self,
        subscribe_id: &str,
        options: &Map<String, Value>,
    ) -> Result<(), RegistryError>;
    fn handle_unsubscribe(&self, subscribe_id: &str) -> Result<(), RegistryError>;
}

/// Startup-populated map of type name to handler.
pub struct MessageTypeRegistry {
    handlers: HashMap<String, Arc<dyn MessageHandler>>,
}

impl MessageTypeRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for a message type. Duplicates are rejected.
    pub fn register(
        &mut self,
        kind: &str,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<(), RegistryError> {
        if self.handlers.contains_key(kind) {
            return Err(RegistryError::DuplicateType(kind.to_string()));
        }
        self.handlers.insert(kind.to_string(), handler);
        Ok(())
    }

    /// Route a subscribe request to the type's handler.
    pub fn handle_subscribe(
        &self,
        kind: &str,
        subscribe_id: &str,
        options: &Map<String, Value>,
    ) -> Result<(), RegistryError> {
        self.handlers
            .get(kind)
            .ok_or_else(|| RegistryError::UnknownType(kind.to_string()))?
            .handle_subscribe(subscribe_id, options)
    }

    /// Route an unsubscribe request to the type's handler.
    pub fn handle_unsubscribe(&self, kind: &str, subscribe_id: &str) -> Result<(), RegistryError> {
        self.handlers
            .get(kind)
            .ok_or_else(|| RegistryError::UnknownType(kind.to_string()))?
            .handle_unsubscribe(subscribe_id)
    }

    /// Start every registered handler.
    pub fn start_all(&self) {
        for handler in self.handlers.values() {
            handler.start();
        }
    }

    /// Stop every registered handler.
    pub fn stop_all(&self) {
        for handler in self.handlers.values() {
            handler.stop();
        }
    }
}

impl Default for MessageTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
