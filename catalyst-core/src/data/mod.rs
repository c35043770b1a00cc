//! Dataset loading and market-data access

pub mod circuit_breaker;
pub mod provider;
pub mod store;
pub mod yahoo;

pub use circuit_breaker::{BreakerState, CircuitBreaker};
pub use provider::{DailyClose, DataError, MarketDataProvider};
pub use store::{CatalystStore, InvalidDataset, StoreError, REQUIRED_COLUMNS};
pub use yahoo::{YahooProvider, YahooSettings};
