//! Market-data provider trait and structured error types.
//!
//! The MarketDataProvider trait abstracts over price sources (Yahoo Finance today)
//! so the price fetcher can be driven by mocks in tests.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One daily close from the provider's recent history window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyClose {
    pub date: NaiveDate,
    pub close: f64,
}

/// Structured error types for provider operations.
///
/// The price fetcher never lets these escape; they are logged and folded into
/// an unavailable price.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("data error: {0}")]
    Other(String),
}

/// Trait for live market-data sources.
///
/// Both lookups are best-effort: a provider may know a symbol's history but not its
/// current quote, or neither.
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Current (last traded) price, if the provider reports one.
    fn current_price(&self, ticker: &str) -> Result<Option<f64>, DataError>;

    /// Daily closes for the most recent one-day window, oldest first.
    fn daily_history(&self, ticker: &str) -> Result<Vec<DailyClose>, DataError>;

    /// Check if the provider is currently available (not rate-limited, not blocked).
    fn is_available(&self) -> bool;
}
