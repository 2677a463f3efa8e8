//! Static fallback dataset.
//!
//! Format: CSV with a header row. The first column is the date (`YYYY-MM-DD`,
//! an optional time suffix is ignored); every other column is a symbol of
//! adjusted closes. Empty and `NaN`/`NA` cells are missing observations.
//!
//! The location is configuration supplied by the caller. Failing to read or
//! parse it is the pipeline's only fatal condition.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use super::provider::DataError;
use crate::domain::{PriceTable, Symbol};

/// A source for the static fallback table.
pub trait FallbackStore: Send + Sync {
    /// Where the dataset lives, for error messages.
    fn location(&self) -> String;

    /// Load the full dataset. Any failure is `DataError::FallbackUnavailable`.
    fn load(&self) -> Result<PriceTable, DataError>;
}

/// Fallback dataset stored as a CSV file on disk.
#[derive(Debug, Clone)]
pub struct CsvFallback {
    path: PathBuf,
}

impl CsvFallback {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn unavailable(&self, reason: impl Into<String>) -> DataError {
        DataError::FallbackUnavailable {
            location: self.location(),
            reason: reason.into(),
        }
    }
}

impl FallbackStore for CsvFallback {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<PriceTable, DataError> {
        let file = std::fs::File::open(&self.path).map_err(|e| self.unavailable(e.to_string()))?;
        parse_price_csv(file).map_err(|reason| self.unavailable(reason))
    }
}

/// Parse a date-indexed price CSV into a table.
pub fn parse_price_csv<R: std::io::Read>(reader: R) -> Result<PriceTable, String> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| format!("failed to read header: {e}"))?
        .clone();
    if headers.len() < 2 {
        return Err("expected a date column followed by at least one symbol column".into());
    }

    let mut symbols = Vec::with_capacity(headers.len() - 1);
    let mut seen = HashSet::new();
    for name in headers.iter().skip(1) {
        let symbol = Symbol::new(name).map_err(|_| "empty symbol column header".to_string())?;
        if !seen.insert(symbol.clone()) {
            return Err(format!("duplicate symbol column {symbol}"));
        }
        symbols.push(symbol);
    }

    let mut rows: Vec<(NaiveDate, Vec<Option<f64>>)> = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = record.map_err(|e| format!("row {}: {e}", line + 2))?;
        let raw_date = record.get(0).unwrap_or_default();
        let date = parse_date(raw_date)
            .ok_or_else(|| format!("row {}: invalid date {raw_date:?}", line + 2))?;

        let mut cells = Vec::with_capacity(symbols.len());
        for (col, field) in record.iter().skip(1).enumerate() {
            let cell = parse_cell(field).map_err(|_| {
                format!(
                    "row {}: column {}: not a number: {field:?}",
                    line + 2,
                    symbols[col]
                )
            })?;
            cells.push(cell);
        }
        rows.push((date, cells));
    }

    rows.sort_by_key(|(d, _)| *d);
    if let Some(pair) = rows.windows(2).find(|w| w[0].0 == w[1].0) {
        return Err(format!("duplicate date {}", pair[0].0));
    }

    let dates = rows.iter().map(|(d, _)| *d).collect();
    let mut columns: BTreeMap<Symbol, Vec<Option<f64>>> = symbols
        .iter()
        .map(|s| (s.clone(), Vec::with_capacity(rows.len())))
        .collect();
    for (_, cells) in rows {
        for (symbol, cell) in symbols.iter().zip(cells) {
            if let Some(col) = columns.get_mut(symbol) {
                col.push(cell);
            }
        }
    }

    PriceTable::new(dates, columns).map_err(|e| e.to_string())
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.split(['T', ' ']).next()?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn parse_cell(raw: &str) -> Result<Option<f64>, std::num::ParseFloatError> {
    match raw {
        "" | "NaN" | "nan" | "NA" | "N/A" | "null" => Ok(None),
        _ => raw.parse::<f64>().map(|v| Some(v).filter(|v| v.is_finite())),
    }
}
