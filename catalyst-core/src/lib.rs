//! Catalyst Core — domain types, dataset loading, live prices, and quality rules.
//!
//! This crate contains everything a refresh pass needs:
//! - Domain types (catalyst records, priced and flagged rows, red flags, verdicts)
//! - Catalyst store (CSV loading and validation)
//! - Future-event filter (upcoming catalysts in date order)
//! - Market-data provider trait and the Yahoo Finance implementation
//! - Price cache and price fetcher (TTL, per-lookup deadline, fallback to history)
//! - Quality rule engine (five fixed trial-design rules)

pub mod data;
pub mod domain;
pub mod filter;
pub mod pricing;
pub mod rules;

pub use data::{CatalystStore, StoreError};
pub use domain::{CatalystRecord, FlaggedCatalyst, PricedCatalyst, RedFlag, Stage, Verdict};
pub use filter::{upcoming, Upcoming};
pub use pricing::{PriceCache, PriceFetcher, PriceLookup};
pub use rules::{evaluate, flag};
