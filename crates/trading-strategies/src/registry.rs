//! Strategy factory registry.

use std::collections::HashMap;
use std::sync::Arc;

use trading_core::error::StrategyError;
use trading_core::traits::StrategyExecutor;
use trading_core::types::{ParameterInfo, StrategyMetadata, StrategyParams};
use trading_store::TradeStore;

use crate::martingale::MartingaleExecutor;
use crate::repeat::RepeatExecutor;

/// Registry of available strategy kinds.
///
/// Populated once at startup; `create` is the only dispatch site over the
/// closed set of kinds.
pub struct StrategyRegistry {
    metadata: HashMap<String, StrategyMetadata>,
}

impl StrategyRegistry {
    /// Create a new registry with all built-in strategy kinds.
    pub fn new() -> Self {
        let mut metadata = HashMap::new();

        metadata.insert(
            "martingale".to_string(),
            StrategyMetadata {
                name: "martingale".to_string(),
                parameters: vec![
                    param("symbol", "string", "Trading symbol (e.g. AAPL)"),
                    param("base_position", "number", "Initial position size in dollars"),
                    param(
                        "take_profit",
                        "number",
                        "Price increase percentage for taking profit (e.g. 1.0 for 1%)",
                    ),
                    param(
                        "max_positions",
                        "number",
                        "Maximum number of increasing positions allowed",
                    ),
                ],
                flow: vec![
                    "1. Start with base_position size".to_string(),
                    "2. Enter long position at market price".to_string(),
                    "3. Set take profit target at entry_price * (1 + take_profit/100)".to_string(),
                    "4. If target hit: Take profit and reset position size to base_position"
                        .to_string(),
                    "5. If price drops: Exit at loss".to_string(),
                    "6. If under max_positions: Double position size and enter new position"
                        .to_string(),
                    "7. If at max_positions: Reset position size to base_position".to_string(),
                    "8. Repeat from step 1".to_string(),
                ],
            },
        );

        metadata.insert(
            "repeat".to_string(),
            StrategyMetadata {
                name: "repeat".to_string(),
                parameters: vec![
                    param("symbol", "string", "Trading symbol (e.g. AAPL)"),
                    param("entry_price", "number", "Buy when the price falls to this level"),
                    param(
                        "exit_price",
                        "number",
                        "Sell when the price rises to this level (must exceed entry_price)",
                    ),
                ],
                flow: vec![
                    "1. Wait for the price to reach entry_price".to_string(),
                    "2. Enter long position".to_string(),
                    "3. Wait for the price to reach exit_price".to_string(),
                    "4. Exit position and repeat from step 1".to_string(),
                ],
            },
        );

        Self { metadata }
    }

    /// List metadata for all registered kinds.
    pub fn list(&self) -> Vec<&StrategyMetadata> {
        self.metadata.values().collect()
    }

    /// Get metadata for a kind.
    pub fn get(&self, kind: &str) -> Option<&StrategyMetadata> {
        self.metadata.get(kind)
    }

    /// Check if a kind is registered.
    pub fn exists(&self, kind: &str) -> bool {
        self.metadata.contains_key(kind)
    }

    /// Get all registered kind names.
    pub fn names(&self) -> Vec<&String> {
        self.metadata.keys().collect()
    }

    /// Create an executor instance, validating `params` for the kind.
    pub fn create(
        &self,
        kind: &str,
        params: &StrategyParams,
        trades: Arc<TradeStore>,
    ) -> Result<Box<dyn StrategyExecutor>, StrategyError> {
        match kind {
            "martingale" => Ok(Box::new(MartingaleExecutor::from_params(params, trades)?)),
            "repeat" => Ok(Box::new(RepeatExecutor::from_params(params, trades)?)),
            _ => Err(StrategyError::UnknownKind(kind.to_string())),
        }
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn param(name: &str, type_tag: &str, description: &str) -> ParameterInfo {
    ParameterInfo {
        name: name.to_string(),
        type_tag: type_tag.to_string(),
        required: true,
        description: description.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

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

    #[test]
    fn test_registry_list() {
        let registry = StrategyRegistry::new();
        assert_eq!(registry.list().len(), 2);
    }

    #[test]
    fn test_registry_get() {
        let registry = StrategyRegistry::new();
        assert!(registry.get("martingale").is_some());
        assert!(registry.get("repeat").is_some());
        assert!(registry.get("unknown").is_none());
    }

    #[test]
    fn test_create_martingale() {
        let registry = StrategyRegistry::new();
        let trades = Arc::new(TradeStore::new());

        let executor = registry.create("martingale", &martingale_params(), trades);
        assert!(executor.is_ok());
    }

    #[test]
    fn test_create_unknown_kind() {
        let registry = StrategyRegistry::new();
        let trades = Arc::new(TradeStore::new());

        let result = registry.create("unknown", &martingale_params(), trades);
        assert!(matches!(result, Err(StrategyError::UnknownKind(_))));
    }

    #[test]
    fn test_create_rejects_bad_params() {
        let registry = StrategyRegistry::new();
        let trades = Arc::new(TradeStore::new());

        let result = registry.create("martingale", &StrategyParams::new(), trades);
        assert!(matches!(result, Err(StrategyError::InvalidConfig(_))));
    }
}
