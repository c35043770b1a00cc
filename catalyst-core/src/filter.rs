//! Future-event filter — keeps upcoming catalysts in date order.

use crate::domain::CatalystRecord;
use chrono::NaiveDate;

/// Outcome of filtering. `Empty` is a normal state, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Upcoming {
    /// At least one catalyst on or after the as-of date, sorted ascending by date.
    Events(Vec<CatalystRecord>),
    /// Nothing scheduled on or after the as-of date.
    Empty,
}

impl Upcoming {
    pub fn len(&self) -> usize {
        match self {
            Upcoming::Events(events) => events.len(),
            Upcoming::Empty => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Upcoming::Empty)
    }

    pub fn as_slice(&self) -> &[CatalystRecord] {
        match self {
            Upcoming::Events(events) => events,
            Upcoming::Empty => &[],
        }
    }

    /// The first `n` upcoming catalysts.
    pub fn top(self, n: usize) -> Vec<CatalystRecord> {
        match self {
            Upcoming::Events(mut events) => {
                events.truncate(n);
                events
            }
            Upcoming::Empty => Vec::new(),
        }
    }
}

/// Keep records dated on or after `as_of`, sorted by date.
///
/// The sort is stable: records sharing a date keep their dataset order.
pub fn upcoming(records: Vec<CatalystRecord>, as_of: NaiveDate) -> Upcoming {
    let mut events: Vec<CatalystRecord> = records
        .into_iter()
        .filter(|r| r.catalyst_date >= as_of)
        .collect();

    if events.is_empty() {
        return Upcoming::Empty;
    }

    events.sort_by_key(|r| r.catalyst_date);
    Upcoming::Events(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Stage;

    fn record(ticker: &str, date: NaiveDate) -> CatalystRecord {
        CatalystRecord {
            ticker: ticker.into(),
            catalyst_date: date,
            event: String::new(),
            stage: Stage::Phase2,
            prior_phase_data: None,
            control_arm: None,
            endpoint_type: None,
            enrollment_n: None,
            cash_runway_mo: None,
        }
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, day).unwrap()
    }

    #[test]
    fn drops_past_keeps_today() {
        let result = upcoming(vec![record("OLD", d(18)), record("NOW", d(19))], d(19));
        let tickers: Vec<&str> = result.as_slice().iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(tickers, ["NOW"]);
    }

    #[test]
    fn sorts_ascending_and_keeps_tie_order() {
        let result = upcoming(
            vec![
                record("C", d(25)),
                record("A1", d(20)),
                record("B", d(22)),
                record("A2", d(20)),
            ],
            d(19),
        );
        let tickers: Vec<&str> = result.as_slice().iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(tickers, ["A1", "A2", "B", "C"]);
    }

    #[test]
    fn all_past_is_empty_state() {
        let result = upcoming(vec![record("A", d(1)), record("B", d(2))], d(19));
        assert_eq!(result, Upcoming::Empty);
        assert!(result.is_empty());
        assert_eq!(result.len(), 0);
        assert!(result.top(10).is_empty());
    }

    #[test]
    fn top_truncates() {
        let records = (20..31).map(|day| record("T", d(day))).collect();
        let result = upcoming(records, d(19));
        assert_eq!(result.len(), 11);
        let top = result.top(10);
        assert_eq!(top.len(), 10);
        assert_eq!(top[9].catalyst_date, d(29));
    }
}
