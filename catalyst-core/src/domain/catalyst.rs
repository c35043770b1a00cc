//! CatalystRecord — one scheduled clinical-trial event, plus its priced form.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Development stage of the trial behind a catalyst.
///
/// Parsing is exact-text: only `"Phase 1"`, `"Phase 2"` and `"Phase 3"` map to the
/// numbered variants. Anything else (including `"phase 3"` or `"Phase 2/3"`) is kept
/// verbatim in `Other` and never satisfies a stage-specific rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Stage {
    Phase1,
    Phase2,
    Phase3,
    Other(String),
}

impl Stage {
    pub fn parse(label: &str) -> Self {
        match label {
            "Phase 1" => Stage::Phase1,
            "Phase 2" => Stage::Phase2,
            "Phase 3" => Stage::Phase3,
            other => Stage::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Stage::Phase1 => "Phase 1",
            Stage::Phase2 => "Phase 2",
            Stage::Phase3 => "Phase 3",
            Stage::Other(label) => label,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<String> for Stage {
    fn from(label: String) -> Self {
        Stage::parse(&label)
    }
}

impl From<Stage> for String {
    fn from(stage: Stage) -> Self {
        stage.label().to_string()
    }
}

/// One upcoming trial event as read from the dataset.
///
/// Free-text trial-design fields are `None` when the cell was empty. Numeric fields are
/// `None` when the cell was empty or could not be coerced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalystRecord {
    pub ticker: String,
    pub catalyst_date: NaiveDate,
    pub event: String,
    pub stage: Stage,
    pub prior_phase_data: Option<String>,
    pub control_arm: Option<String>,
    pub endpoint_type: Option<String>,
    pub enrollment_n: Option<u32>,
    pub cash_runway_mo: Option<f64>,
}

impl CatalystRecord {
    /// Attach a live price. Non-finite or non-positive prices are stored as unavailable.
    pub fn with_price(self, live_price: Option<f64>) -> PricedCatalyst {
        PricedCatalyst {
            record: self,
            live_price: live_price.filter(|p| p.is_finite() && *p > 0.0),
        }
    }
}

/// A catalyst enriched with its live market price (`None` = unavailable).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedCatalyst {
    #[serde(flatten)]
    pub record: CatalystRecord,
    pub live_price: Option<f64>,
}
