//! The result of one refresh pass: either an empty state or the flagged top-N rows.

use catalyst_core::FlaggedCatalyst;
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Dashboard {
    /// No catalyst is dated on or after `as_of`.
    Empty { as_of: NaiveDate, total_records: usize },
    /// Flagged rows for the top-N window, in date order.
    Ready {
        as_of: NaiveDate,
        total_upcoming: usize,
        rows: Vec<FlaggedCatalyst>,
    },
}

impl Dashboard {
    pub fn as_of(&self) -> NaiveDate {
        match self {
            Dashboard::Empty { as_of, .. } | Dashboard::Ready { as_of, .. } => *as_of,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Dashboard::Empty { .. })
    }

    pub fn rows(&self) -> &[FlaggedCatalyst] {
        match self {
            Dashboard::Ready { rows, .. } => rows,
            Dashboard::Empty { .. } => &[],
        }
    }

    /// Detail-view lookup: the first row with exactly this ticker.
    pub fn select(&self, ticker: &str) -> Option<&FlaggedCatalyst> {
        self.rows().iter().find(|row| row.ticker() == ticker)
    }

    /// Tickers in display order, duplicates removed.
    pub fn tickers(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for row in self.rows() {
            if !seen.contains(&row.ticker()) {
                seen.push(row.ticker());
            }
        }
        seen
    }

    pub fn priced_count(&self) -> usize {
        self.rows().iter().filter(|r| r.live_price().is_some()).count()
    }

    pub fn flagged_count(&self) -> usize {
        self.rows().iter().filter(|r| !r.is_clean()).count()
    }
}
