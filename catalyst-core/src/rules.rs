//! Quality rule engine — flags structurally weak trial designs.
//!
//! Every rule is a pure predicate over a single record. Rules are evaluated in
//! [`QualityRule::ALL`] order and each contributes at most one flag, so the output
//! order always follows the rule table regardless of which rules fire.
//!
//! Text markers are matched case-sensitively with plain substring containment.
//! Absent text or numbers never fire a rule.

use crate::domain::{CatalystRecord, FlaggedCatalyst, PricedCatalyst, QualityRule, RedFlag, Stage};

/// Phase 1 trials enrolling fewer patients than this are underpowered.
pub const MIN_PHASE1_ENROLLMENT: u32 = 20;

/// Companies with less runway than this (months) are in the dilution zone.
pub const DILUTION_RUNWAY_MONTHS: f64 = 4.0;

const SKIPPED_MARKER: &str = "Skipped";
const SINGLE_ARM_MARKER: &str = "Single Arm";
const SURROGATE_MARKER: &str = "Surrogate";

/// Evaluate every rule against one record.
pub fn evaluate(record: &CatalystRecord) -> Vec<RedFlag> {
    QualityRule::ALL
        .iter()
        .filter_map(|&rule| check(rule, record))
        .collect()
}

/// Attach red flags to a priced catalyst.
pub fn flag(priced: PricedCatalyst) -> FlaggedCatalyst {
    let red_flags = evaluate(&priced.record);
    FlaggedCatalyst::new(priced, red_flags)
}

/// Apply a single rule; `None` when it does not fire.
pub fn check(rule: QualityRule, record: &CatalystRecord) -> Option<RedFlag> {
    match rule {
        QualityRule::SkippedPhase2 => {
            let fires = record.stage == Stage::Phase3
                && contains(&record.prior_phase_data, SKIPPED_MARKER);
            fires.then(|| {
                RedFlag::new(
                    rule,
                    "Skipped Phase 2. Historical Phase 3 success rate drops to 31% vs. 57% with proper Phase 2.",
                )
            })
        }
        QualityRule::SingleArm => contains(&record.control_arm, SINGLE_ARM_MARKER).then(|| {
            RedFlag::new(
                rule,
                "Single Arm Trial. No control group = high risk of placebo effect masquerading as efficacy.",
            )
        }),
        QualityRule::SurrogateEndpoint => contains(&record.endpoint_type, SURROGATE_MARKER).then(|| {
            RedFlag::new(
                rule,
                "Surrogate Endpoint. FDA prefers clinical outcomes (OS) over surrogates (PFS) for full approval.",
            )
        }),
        QualityRule::Underpowered => {
            if record.stage != Stage::Phase1 {
                return None;
            }
            let n = record.enrollment_n.filter(|&n| n < MIN_PHASE1_ENROLLMENT)?;
            Some(RedFlag::new(
                rule,
                format!("Underpowered (N={n}). Sample size too small for statistical reliability."),
            ))
        }
        QualityRule::DilutionZone => {
            let months = record.cash_runway_mo.filter(|&m| m < DILUTION_RUNWAY_MONTHS)?;
            Some(RedFlag::new(
                rule,
                format!("Dilution Zone. Only {months:.1} months cash. Offering likely within 8 weeks."),
            ))
        }
    }
}

fn contains(field: &Option<String>, marker: &str) -> bool {
    field.as_deref().is_some_and(|text| text.contains(marker))
}
