//! Strategy instance records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Free-form strategy parameters, validated by the kind's factory.
pub type StrategyParams = serde_json::Map<String, serde_json::Value>;

/// Strategy lifecycle status. Matches the partition the record lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyStatus {
    Active,
    Stopped,
}

/// One strategy instance from start to stop.
///
/// `parameters` are immutable after creation; `stop` stamps `stop_time`
/// exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Strategy {
    /// Process-unique identifier, format `<kind>-<uuid>`
    pub id: String,
    /// Key into the strategy factory registry
    pub kind: String,
    pub parameters: StrategyParams,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_time: Option<DateTime<Utc>>,
    pub status: StrategyStatus,
}

impl Strategy {
    /// Create a new active strategy record with `start_time = now`.
    pub fn activate(kind: impl Into<String>, parameters: StrategyParams) -> Self {
        let kind = kind.into();
        Self {
            id: format!("{}-{}", kind, Uuid::new_v4()),
            kind,
            parameters,
            start_time: Utc::now(),
            stop_time: None,
            status: StrategyStatus::Active,
        }
    }

    /// Mark the record stopped with `stop_time = now`.
    pub fn stop(&mut self) {
        self.stop_time = Some(Utc::now());
        self.status = StrategyStatus::Stopped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> StrategyParams {
        let mut map = StrategyParams::new();
        map.insert("symbol".into(), "AAPL".into());
        map
    }

    #[test]
    fn test_activate() {
        let strategy = Strategy::activate("martingale", params());

        assert!(strategy.id.starts_with("martingale-"));
        assert_eq!(strategy.kind, "martingale");
        assert_eq!(strategy.status, StrategyStatus::Active);
        assert!(strategy.stop_time.is_none());
    }

    #[test]
    fn test_stop() {
        let mut strategy = Strategy::activate("martingale", params());
        strategy.stop();

        assert_eq!(strategy.status, StrategyStatus::Stopped);
        assert!(strategy.stop_time.is_some());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let strategy = Strategy::activate("martingale", params());
        let json = serde_json::to_value(&strategy).unwrap();
        assert_eq!(json["status"], "active");
    }
}
