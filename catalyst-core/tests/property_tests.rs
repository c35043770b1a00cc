//! Property tests for filter and rule-engine invariants.
//!
//! Uses proptest to verify:
//! 1. Filter output is sorted by date and never contains past events
//! 2. Filter keeps every qualifying record exactly once
//! 3. Rule evaluation is deterministic
//! 4. Flags are emitted in rule-table order, one per rule at most

use catalyst_core::domain::{CatalystRecord, QualityRule, Stage};
use catalyst_core::{evaluate, flag, upcoming};
use chrono::NaiveDate;
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (0i64..120).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2026, 9, 1).unwrap() + chrono::Duration::days(offset)
    })
}

fn arb_stage() -> impl Strategy<Value = Stage> {
    prop_oneof![
        Just(Stage::Phase1),
        Just(Stage::Phase2),
        Just(Stage::Phase3),
        Just(Stage::Other("Phase 2/3".into())),
    ]
}

fn arb_text(marker: &'static str) -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some(marker.to_string())),
        Just(Some(format!("{marker} (details)"))),
        Just(Some(marker.to_lowercase())),
        "[A-Za-z ]{0,12}".prop_map(Some),
    ]
}

prop_compose! {
    fn arb_record()(
        ticker in "[A-Z]{2,5}",
        catalyst_date in arb_date(),
        stage in arb_stage(),
        prior_phase_data in arb_text("Skipped"),
        control_arm in arb_text("Single Arm"),
        endpoint_type in arb_text("Surrogate"),
        enrollment_n in proptest::option::of(0u32..60),
        cash_runway_mo in proptest::option::of(0.0..24.0_f64),
    ) -> CatalystRecord {
        CatalystRecord {
            ticker,
            catalyst_date,
            event: "Readout".into(),
            stage,
            prior_phase_data,
            control_arm,
            endpoint_type,
            enrollment_n,
            cash_runway_mo,
        }
    }
}

// ── 1-2. Filter ──────────────────────────────────────────────────────

proptest! {
    /// Output is sorted non-decreasing and every element is on or after as-of.
    #[test]
    fn filter_sorted_and_upcoming(
        records in proptest::collection::vec(arb_record(), 0..40),
        as_of in arb_date(),
    ) {
        let result = upcoming(records, as_of);
        let events = result.as_slice();
        for pair in events.windows(2) {
            prop_assert!(pair[0].catalyst_date <= pair[1].catalyst_date);
        }
        for event in events {
            prop_assert!(event.catalyst_date >= as_of);
        }
    }

    /// Every qualifying record survives; empty output means nothing qualified.
    #[test]
    fn filter_keeps_all_qualifying(
        records in proptest::collection::vec(arb_record(), 0..40),
        as_of in arb_date(),
    ) {
        let expected = records.iter().filter(|r| r.catalyst_date >= as_of).count();
        let result = upcoming(records, as_of);
        prop_assert_eq!(result.len(), expected);
        prop_assert_eq!(result.is_empty(), expected == 0);
    }
}

// ── 3-4. Rule engine ─────────────────────────────────────────────────

proptest! {
    /// Evaluating the same record twice yields identical flags.
    #[test]
    fn evaluate_is_deterministic(record in arb_record()) {
        prop_assert_eq!(evaluate(&record), evaluate(&record.clone()));
    }

    /// Flags follow the rule table order, each rule at most once, and the count matches.
    #[test]
    fn flags_ordered_and_counted(record in arb_record(), price in proptest::option::of(0.5..200.0_f64)) {
        let flagged = flag(record.with_price(price));
        prop_assert_eq!(flagged.flag_count(), flagged.red_flags.len());

        let positions: Vec<usize> = flagged
            .red_flags
            .iter()
            .map(|f| QualityRule::ALL.iter().position(|r| *r == f.rule).unwrap())
            .collect();
        for pair in positions.windows(2) {
            prop_assert!(pair[0] < pair[1]);
        }
        prop_assert_eq!(flagged.verdict().to_string().starts_with("AVOID"), flagged.flag_count() > 0);
    }

    /// Rule 5 fires exactly when runway is present and strictly below four months.
    #[test]
    fn dilution_rule_matches_definition(record in arb_record()) {
        let fired = evaluate(&record).iter().any(|f| f.rule == QualityRule::DilutionZone);
        prop_assert_eq!(fired, record.cash_runway_mo.is_some_and(|m| m < 4.0));
    }

    /// Rule 4 fires exactly for Phase 1 with a known enrollment below 20.
    #[test]
    fn underpowered_rule_matches_definition(record in arb_record()) {
        let fired = evaluate(&record).iter().any(|f| f.rule == QualityRule::Underpowered);
        let expected = record.stage == Stage::Phase1 && record.enrollment_n.is_some_and(|n| n < 20);
        prop_assert_eq!(fired, expected);
    }
}
