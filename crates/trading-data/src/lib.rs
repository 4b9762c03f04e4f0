//! Market data sources.

mod synthetic;

pub use synthetic::{SyntheticTickConfig, SyntheticTickSource};
