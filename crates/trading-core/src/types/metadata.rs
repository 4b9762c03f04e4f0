//! Strategy discovery metadata.

use serde::{Deserialize, Serialize};

/// Describes one declared strategy parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterInfo {
    pub name: String,
    /// Type tag shown to clients ("string", "number", ...)
    #[serde(rename = "type")]
    pub type_tag: String,
    pub required: bool,
    pub description: String,
}

/// Discovery record for a registered strategy kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyMetadata {
    pub name: String,
    pub parameters: Vec<ParameterInfo>,
    /// Free-form narrative of the strategy's decision flow
    #[serde(rename = "strategy_flow")]
    pub flow: Vec<String>,
}
