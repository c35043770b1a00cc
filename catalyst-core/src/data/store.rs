//! Catalyst store — reads and validates the CSV dataset.
//!
//! The dataset is a UTF-8 CSV with one header row. Column order does not matter and
//! extra columns are ignored, but every name in [`REQUIRED_COLUMNS`] must be present.
//!
//! Loading is all-or-nothing: a missing file, a missing column, or a single
//! unparseable date fails the whole load. Everything else is lenient: rows may stop
//! short of the header, and missing or uncoercible cells become `None`.

use crate::domain::{CatalystRecord, Stage};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Column names the dataset header must contain.
pub const REQUIRED_COLUMNS: [&str; 9] = [
    "Ticker",
    "Catalyst_Date",
    "Event",
    "Stage",
    "Prior_Phase_Data",
    "Control_Arm",
    "Endpoint_Type",
    "Enrollment_N",
    "Cash_Runway_Mo",
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Fatal dataset errors. Either one aborts the run.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("catalyst dataset not found: {}", path.display())]
    DataSourceMissing { path: PathBuf },

    #[error("catalyst dataset {} is invalid: {reason}", path.display())]
    DataSourceInvalid {
        path: PathBuf,
        #[source]
        reason: InvalidDataset,
    },
}

/// Why a dataset was rejected.
#[derive(Debug, Error)]
pub enum InvalidDataset {
    #[error("missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("row {row}: unparseable Catalyst_Date '{value}'")]
    UnparseableDate { row: usize, value: String },

    #[error("malformed CSV: {0}")]
    Malformed(String),

    #[error("read failed: {0}")]
    Io(String),
}

/// Handle on the dataset file. Cheap to clone; reads happen on `load`.
#[derive(Debug, Clone)]
pub struct CatalystStore {
    path: PathBuf,
}

impl CatalystStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and validate every record in the dataset.
    pub fn load(&self) -> Result<Vec<CatalystRecord>, StoreError> {
        let file = File::open(&self.path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StoreError::DataSourceMissing {
                path: self.path.clone(),
            },
            _ => self.invalid(InvalidDataset::Io(e.to_string())),
        })?;
        let records = self.read(file)?;
        debug!(path = %self.path.display(), records = records.len(), "catalyst dataset loaded");
        Ok(records)
    }

    /// Parse records from any reader; errors are attributed to this store's path.
    pub fn read<R: Read>(&self, reader: R) -> Result<Vec<CatalystRecord>, StoreError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader
            .headers()
            .map_err(|e| self.invalid(InvalidDataset::Malformed(e.to_string())))?
            .clone();
        let columns = ColumnIndex::from_headers(&headers).map_err(|e| self.invalid(e))?;

        let mut records = Vec::new();
        for (i, row) in csv_reader.records().enumerate() {
            let row_number = i + 1;
            let row = row.map_err(|e| {
                self.invalid(InvalidDataset::Malformed(format!("row {row_number}: {e}")))
            })?;
            let record = columns.record(&row, row_number).map_err(|e| self.invalid(e))?;
            records.push(record);
        }
        Ok(records)
    }

    fn invalid(&self, reason: InvalidDataset) -> StoreError {
        StoreError::DataSourceInvalid {
            path: self.path.clone(),
            reason,
        }
    }
}

/// Position of each required column in the header row.
struct ColumnIndex {
    positions: HashMap<&'static str, usize>,
}

impl ColumnIndex {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, InvalidDataset> {
        let found: HashMap<&str, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim_start_matches('\u{feff}').trim(), i))
            .collect();

        let mut positions = HashMap::new();
        let mut missing = Vec::new();
        for column in REQUIRED_COLUMNS {
            match found.get(column) {
                Some(&i) => {
                    positions.insert(column, i);
                }
                None => missing.push(column.to_string()),
            }
        }

        if !missing.is_empty() {
            return Err(InvalidDataset::MissingColumns(missing));
        }
        Ok(Self { positions })
    }

    fn cell<'r>(&self, row: &'r csv::StringRecord, column: &str) -> &'r str {
        self.positions
            .get(column)
            .and_then(|&i| row.get(i))
            .unwrap_or("")
    }

    fn record(&self, row: &csv::StringRecord, row_number: usize) -> Result<CatalystRecord, InvalidDataset> {
        let raw_date = self.cell(row, "Catalyst_Date");
        let catalyst_date = parse_date(raw_date).ok_or_else(|| InvalidDataset::UnparseableDate {
            row: row_number,
            value: raw_date.to_string(),
        })?;

        Ok(CatalystRecord {
            ticker: self.cell(row, "Ticker").to_string(),
            catalyst_date,
            event: self.cell(row, "Event").to_string(),
            stage: Stage::parse(self.cell(row, "Stage")),
            prior_phase_data: non_empty(self.cell(row, "Prior_Phase_Data")),
            control_arm: non_empty(self.cell(row, "Control_Arm")),
            endpoint_type: non_empty(self.cell(row, "Endpoint_Type")),
            enrollment_n: coerce_enrollment(self.cell(row, "Enrollment_N")),
            cash_runway_mo: coerce_runway(self.cell(row, "Cash_Runway_Mo")),
        })
    }
}

/// Parse a calendar date, discarding any time-of-day component.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
}

fn non_empty(raw: &str) -> Option<String> {
    let raw = raw.trim();
    (!raw.is_empty()).then(|| raw.to_string())
}

/// Whole, non-negative head counts only. `"15.0"` is accepted, `"15.5"` is not.
fn coerce_enrollment(raw: &str) -> Option<u32> {
    let value: f64 = raw.trim().parse().ok()?;
    let integral = value.is_finite() && value >= 0.0 && value.fract() == 0.0;
    (integral && value <= f64::from(u32::MAX)).then_some(value as u32)
}

fn coerce_runway(raw: &str) -> Option<f64> {
    let value: f64 = raw.trim().parse().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}
