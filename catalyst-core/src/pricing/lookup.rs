//! Outcome of a single price lookup.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why no price could be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    /// The record had no ticker to look up.
    EmptyTicker,
    /// The provider answered but had neither a current price nor a usable close.
    NoQuote,
    /// The provider failed on every attempt.
    ProviderError,
    /// The circuit breaker is open.
    ProviderBlocked,
    /// The lookup did not finish within its deadline.
    TimedOut,
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            UnavailableReason::EmptyTicker => "empty ticker",
            UnavailableReason::NoQuote => "no quote",
            UnavailableReason::ProviderError => "provider error",
            UnavailableReason::ProviderBlocked => "provider blocked",
            UnavailableReason::TimedOut => "timed out",
        };
        f.write_str(text)
    }
}

/// A live price, or an explicit reason there is none.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum PriceLookup {
    /// A finite, strictly positive price.
    Available(f64),
    Unavailable(UnavailableReason),
}

impl PriceLookup {
    /// Build from a raw provider value; anything non-finite or non-positive is rejected.
    pub fn from_raw(value: f64) -> Option<Self> {
        (value.is_finite() && value > 0.0).then_some(PriceLookup::Available(value))
    }

    pub fn price(&self) -> Option<f64> {
        match self {
            PriceLookup::Available(p) => Some(*p),
            PriceLookup::Unavailable(_) => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, PriceLookup::Available(_))
    }
}

impl From<PriceLookup> for Option<f64> {
    fn from(lookup: PriceLookup) -> Self {
        lookup.price()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_rejects_non_positive() {
        assert_eq!(PriceLookup::from_raw(1.5), Some(PriceLookup::Available(1.5)));
        assert_eq!(PriceLookup::from_raw(0.0), None);
        assert_eq!(PriceLookup::from_raw(-1.0), None);
        assert_eq!(PriceLookup::from_raw(f64::INFINITY), None);
    }

    #[test]
    fn converts_to_option() {
        let price: Option<f64> = PriceLookup::Available(2.0).into();
        assert_eq!(price, Some(2.0));
        let none: Option<f64> = PriceLookup::Unavailable(UnavailableReason::TimedOut).into();
        assert_eq!(none, None);
    }
}
