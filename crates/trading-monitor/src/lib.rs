//! Observability for the trading server.

mod logging;

pub use logging::setup_logging;
