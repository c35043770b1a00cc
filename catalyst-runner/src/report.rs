//! Text and JSON rendering for the dashboard table and the detail view.

use crate::dashboard::Dashboard;
use catalyst_core::FlaggedCatalyst;
use chrono::NaiveDate;
use serde::Serialize;

const EVENT_WIDTH: usize = 36;

/// `$12.34`, or `N/A` when the price is unavailable.
pub fn format_price(price: Option<f64>) -> String {
    match price {
        Some(p) => format!("${p:.2}"),
        None => "N/A".to_string(),
    }
}

/// `3.5 Mo`; `None` when the runway is unknown so the metric can be omitted.
pub fn format_runway(months: Option<f64>) -> Option<String> {
    months.map(|m| format!("{m:.1} Mo"))
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// The catalyst table: ticker, date, event, stage, price, flag count.
pub fn render_table(rows: &[FlaggedCatalyst]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<8} {:<10} {:<ew$} {:<10} {:>10} {:>5}\n",
        "Ticker",
        "Date",
        "Event",
        "Stage",
        "Price",
        "Flags",
        ew = EVENT_WIDTH
    ));
    out.push_str(&"-".repeat(8 + 10 + EVENT_WIDTH + 10 + 10 + 5 + 5));
    out.push('\n');
    for row in rows {
        let record = row.record();
        out.push_str(&format!(
            "{:<8} {:<10} {:<ew$} {:<10} {:>10} {:>5}\n",
            record.ticker,
            record.catalyst_date.to_string(),
            truncate(&record.event, EVENT_WIDTH),
            truncate(record.stage.label(), 10),
            format_price(row.live_price()),
            row.flag_count(),
            ew = EVENT_WIDTH
        ));
    }
    out
}

/// The detail view for one selected row.
pub fn render_detail(row: &FlaggedCatalyst) -> String {
    let record = row.record();
    let mut out = String::new();
    out.push_str(&format!("=== {}: {} ===\n", record.ticker, record.event));
    out.push_str(&format!("Date:           {}\n", record.catalyst_date));
    out.push_str(&format!("Stage:          {}\n", record.stage));
    out.push_str(&format!("Live Price:     {}\n", format_price(row.live_price())));
    if let Some(runway) = format_runway(record.cash_runway_mo) {
        out.push_str(&format!("Cash Runway:    {runway}\n"));
    }
    out.push('\n');

    if row.is_clean() {
        out.push_str("Clean Trial Design\n");
    } else {
        out.push_str(&format!("{} Structural Flaw(s) Detected:\n", row.flag_count()));
        for flag in &row.red_flags {
            out.push_str(&format!("  - {flag}\n"));
        }
    }
    out.push('\n');
    out.push_str(&format!("Verdict: {}\n", row.verdict()));
    out
}

/// The message shown instead of a table when nothing is upcoming.
pub fn render_empty(source: &str, as_of: NaiveDate) -> String {
    format!("No upcoming catalysts found in {source} (as of {as_of}).\n")
}

/// Flat JSON row: the table columns plus flags and verdict.
#[derive(Debug, Serialize)]
pub struct CatalystRow<'a> {
    pub ticker: &'a str,
    pub catalyst_date: NaiveDate,
    pub event: &'a str,
    pub stage: &'a str,
    pub live_price: Option<f64>,
    pub price: String,
    pub cash_runway_mo: Option<f64>,
    pub flag_count: usize,
    pub red_flags: Vec<String>,
    pub verdict: String,
}

impl<'a> CatalystRow<'a> {
    pub fn from_flagged(row: &'a FlaggedCatalyst) -> Self {
        let record = row.record();
        Self {
            ticker: &record.ticker,
            catalyst_date: record.catalyst_date,
            event: &record.event,
            stage: record.stage.label(),
            live_price: row.live_price(),
            price: format_price(row.live_price()),
            cash_runway_mo: record.cash_runway_mo,
            flag_count: row.flag_count(),
            red_flags: row.red_flags.iter().map(|f| f.to_string()).collect(),
            verdict: row.verdict().to_string(),
        }
    }
}

/// Pretty-printed JSON array of dashboard rows (empty array for the empty state).
pub fn to_json(dashboard: &Dashboard) -> Result<String, serde_json::Error> {
    let rows: Vec<CatalystRow<'_>> = dashboard.rows().iter().map(CatalystRow::from_flagged).collect();
    serde_json::to_string_pretty(&rows)
}
