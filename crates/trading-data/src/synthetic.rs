//! Synthetic tick source.
//!
//! Generates a per-symbol random walk without network dependency. Each call
//! picks a random symbol and moves its last price by up to ±0.5%.

use parking_lot::Mutex;
use rand::prelude::*;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use trading_core::error::DataError;
use trading_core::traits::TickSource;
use trading_core::types::Tick;

/// Configuration for the synthetic feed.
#[derive(Debug, Clone)]
pub struct SyntheticTickConfig {
    /// Symbols and their starting prices
    pub symbols: Vec<(String, Decimal)>,
    /// Seed for reproducibility; entropy-seeded when unset
    pub seed: Option<u64>,
}

impl SyntheticTickConfig {
    pub fn new(symbols: Vec<(String, Decimal)>) -> Self {
        Self {
            symbols,
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn deterministic(seed: u64) -> Self {
        Self {
            symbols: default_symbols(),
            seed: Some(seed),
        }
    }
}

impl Default for SyntheticTickConfig {
    fn default() -> Self {
        Self::new(default_symbols())
    }
}

fn default_symbols() -> Vec<(String, Decimal)> {
    vec![
        ("BTC/USD".to_string(), Decimal::from(40000)),
        ("ETH/USD".to_string(), Decimal::from(2500)),
        ("SOL/USD".to_string(), Decimal::from(100)),
    ]
}

/// Seedable random-walk tick source.
pub struct SyntheticTickSource {
    state: Mutex<WalkState>,
}

struct WalkState {
    /// Symbol order is fixed so seeded runs are reproducible
    symbols: Vec<String>,
    prices: Vec<Decimal>,
    rng: StdRng,
}

impl SyntheticTickSource {
    pub fn new(config: SyntheticTickConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let (symbols, prices) = config.symbols.into_iter().unzip();

        Self {
            state: Mutex::new(WalkState {
                symbols,
                prices,
                rng,
            }),
        }
    }
}

impl Default for SyntheticTickSource {
    fn default() -> Self {
        Self::new(SyntheticTickConfig::default())
    }
}

impl TickSource for SyntheticTickSource {
    fn next_tick(&self) -> Result<Tick, DataError> {
        let mut state = self.state.lock();
        if state.symbols.is_empty() {
            return Err(DataError::NoSymbols);
        }

        let symbols_len = state.symbols.len();
        let index = state.rng.gen_range(0..symbols_len);
        // Multiplicative step in (-0.5%, +0.5%) keeps prices positive
        let step = state.rng.gen_range(-0.005..0.005);
        let factor = Decimal::ONE + Decimal::from_f64(step).unwrap_or(Decimal::ZERO);
        let price = (state.prices[index] * factor).round_dp(8);
        state.prices[index] = price;

        let volume = Decimal::from_f64(state.rng.gen_range(0.0..100.0))
            .unwrap_or(Decimal::ZERO)
            .round_dp(4);
        let symbol = state.symbols[index].clone();

        Ok(Tick::new(symbol, price, volume))
    }
}
