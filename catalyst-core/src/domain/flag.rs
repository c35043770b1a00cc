//! Red flags, verdicts, and the fully enriched catalyst row.

use super::catalyst::{CatalystRecord, PricedCatalyst};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The five trial-design quality rules, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityRule {
    SkippedPhase2,
    SingleArm,
    SurrogateEndpoint,
    Underpowered,
    DilutionZone,
}

impl QualityRule {
    /// Every rule, in the order flags are emitted.
    pub const ALL: [QualityRule; 5] = [
        QualityRule::SkippedPhase2,
        QualityRule::SingleArm,
        QualityRule::SurrogateEndpoint,
        QualityRule::Underpowered,
        QualityRule::DilutionZone,
    ];

    pub fn severity(self) -> Severity {
        match self {
            QualityRule::SkippedPhase2 | QualityRule::Underpowered => Severity::Critical,
            QualityRule::SingleArm | QualityRule::SurrogateEndpoint => Severity::Warning,
            QualityRule::DilutionZone => Severity::Financial,
        }
    }
}

/// How bad a red flag is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Structural flaw in the trial design.
    Critical,
    /// Design weakness that raises the odds of a misleading readout.
    Warning,
    /// Balance-sheet risk independent of the trial itself.
    Financial,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Critical => write!(f, "CRITICAL"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Financial => write!(f, "FINANCIAL"),
        }
    }
}

/// One fired rule with its human-readable explanation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedFlag {
    pub rule: QualityRule,
    pub severity: Severity,
    pub message: String,
}

impl RedFlag {
    pub fn new(rule: QualityRule, message: impl Into<String>) -> Self {
        Self {
            rule,
            severity: rule.severity(),
            message: message.into(),
        }
    }
}

impl fmt::Display for RedFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// Trading verdict derived from the number of red flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    AvoidShortSetup,
    LongOk,
}

impl Verdict {
    pub fn from_flag_count(flag_count: usize) -> Self {
        if flag_count > 0 {
            Verdict::AvoidShortSetup
        } else {
            Verdict::LongOk
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::AvoidShortSetup => write!(f, "AVOID/SHORT SETUP"),
            Verdict::LongOk => write!(f, "LONG OK, pending catalyst outcome"),
        }
    }
}

/// A priced catalyst with its red flags attached.
///
/// `flag_count` and `verdict` are derived from `red_flags` so they cannot drift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlaggedCatalyst {
    #[serde(flatten)]
    pub priced: PricedCatalyst,
    pub red_flags: Vec<RedFlag>,
}

impl FlaggedCatalyst {
    pub fn new(priced: PricedCatalyst, red_flags: Vec<RedFlag>) -> Self {
        Self { priced, red_flags }
    }

    pub fn record(&self) -> &CatalystRecord {
        &self.priced.record
    }

    pub fn ticker(&self) -> &str {
        &self.priced.record.ticker
    }

    pub fn live_price(&self) -> Option<f64> {
        self.priced.live_price
    }

    pub fn flag_count(&self) -> usize {
        self.red_flags.len()
    }

    pub fn is_clean(&self) -> bool {
        self.red_flags.is_empty()
    }

    pub fn verdict(&self) -> Verdict {
        Verdict::from_flag_count(self.flag_count())
    }
}
