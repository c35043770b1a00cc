//! Domain types for the catalyst scanner

pub mod catalyst;
pub mod flag;

pub use catalyst::{CatalystRecord, PricedCatalyst, Stage};
pub use flag::{FlaggedCatalyst, QualityRule, RedFlag, Severity, Verdict};

/// Ticker symbol type alias
pub type Ticker = String;
