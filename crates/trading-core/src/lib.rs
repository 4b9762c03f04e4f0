//! Core types and traits for the trading server.
//!
//! This crate provides the foundational building blocks including:
//! - Trade and tick market types
//! - Strategy records and discovery metadata
//! - Trade lifecycle events
//! - Core traits for tick sources and strategy executors

pub mod error;
pub mod traits;
pub mod types;

pub use error::{DataError, ExecutorError, RegistryError, StrategyError, TradeError};
pub use traits::*;
pub use types::*;
