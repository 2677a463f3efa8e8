//! Aligned price table: one row per trading date, one column per symbol.
//!
//! Missing observations are `None`, never NaN and never forward-filled.
//! Downstream computations treat absence as "no value" rather than an error.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::Symbol;
use crate::data::DataError;

/// Adjusted-close prices for a set of symbols on a common, strictly
/// increasing date axis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceTable {
    dates: Vec<NaiveDate>,
    columns: BTreeMap<Symbol, Vec<Option<f64>>>,
}

impl PriceTable {
    /// Build a table from a date axis and per-symbol columns.
    ///
    /// Dates must be strictly increasing and every column must have one cell
    /// per date. Non-finite prices are stored as missing.
    pub fn new(
        dates: Vec<NaiveDate>,
        columns: BTreeMap<Symbol, Vec<Option<f64>>>,
    ) -> Result<Self, DataError> {
        if let Some(pair) = dates.windows(2).find(|w| w[0] >= w[1]) {
            return Err(DataError::InvalidTable(format!(
                "dates not strictly increasing: {} then {}",
                pair[0], pair[1]
            )));
        }

        let mut normalized = BTreeMap::new();
        for (symbol, cells) in columns {
            if cells.len() != dates.len() {
                return Err(DataError::InvalidTable(format!(
                    "column {symbol} has {} cells for {} dates",
                    cells.len(),
                    dates.len()
                )));
            }
            let cells = cells
                .into_iter()
                .map(|c| c.filter(|v| v.is_finite()))
                .collect();
            normalized.insert(symbol, cells);
        }

        Ok(Self {
            dates,
            columns: normalized,
        })
    }

    /// Align per-symbol `(date, price)` series on the union of their dates.
    ///
    /// A symbol with no observations contributes no column. Cells for dates a
    /// symbol did not trade are `None`.
    pub fn from_series(series: BTreeMap<Symbol, Vec<(NaiveDate, f64)>>) -> Self {
        let all_dates: BTreeSet<NaiveDate> = series
            .values()
            .flat_map(|points| points.iter().map(|(d, _)| *d))
            .collect();
        let dates: Vec<NaiveDate> = all_dates.into_iter().collect();

        let mut columns = BTreeMap::new();
        for (symbol, points) in series {
            if points.is_empty() {
                continue;
            }
            let by_date: HashMap<NaiveDate, f64> = points.into_iter().collect();
            let cells = dates
                .iter()
                .map(|d| by_date.get(d).copied().filter(|v| v.is_finite()))
                .collect();
            columns.insert(symbol, cells);
        }

        Self { dates, columns }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn columns(&self) -> &BTreeMap<Symbol, Vec<Option<f64>>> {
        &self.columns
    }

    /// Symbols present in the table, in sorted order.
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.columns.keys()
    }

    pub fn column(&self, symbol: &str) -> Option<&[Option<f64>]> {
        self.columns.get(symbol).map(|c| c.as_slice())
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.columns.contains_key(symbol)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Number of symbol columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// True when there are no rows or no columns.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty() || self.columns.is_empty()
    }

    /// Keep only the requested symbols and the rows inside `[start, end]`.
    ///
    /// A column left with no prices is dropped, the same way `from_series`
    /// drops a symbol with no observations.
    pub fn restrict(&self, symbols: &BTreeSet<Symbol>, start: NaiveDate, end: NaiveDate) -> Self {
        let keep: Vec<usize> = self
            .dates
            .iter()
            .enumerate()
            .filter(|(_, d)| **d >= start && **d <= end)
            .map(|(i, _)| i)
            .collect();

        let dates = keep.iter().map(|&i| self.dates[i]).collect();
        let columns = self
            .columns
            .iter()
            .filter(|(symbol, _)| symbols.contains(*symbol))
            .map(|(symbol, cells)| {
                let sliced: Vec<Option<f64>> = keep.iter().map(|&i| cells[i]).collect();
                (symbol.clone(), sliced)
            })
            .filter(|(_, cells)| cells.iter().any(Option::is_some))
            .collect();

        Self { dates, columns }
    }

    /// Requested symbols that have no column in this table, in request order.
    pub fn missing_from<'a>(&self, requested: impl IntoIterator<Item = &'a Symbol>) -> Vec<Symbol> {
        let mut seen = BTreeSet::new();
        requested
            .into_iter()
            .filter(|s| !self.contains(s.as_str()) && seen.insert((*s).clone()))
            .cloned()
            .collect()
    }

    /// Deterministic BLAKE3 hash over dates, symbols, and cell values.
    pub fn dataset_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for date in &self.dates {
            hasher.update(date.to_string().as_bytes());
        }
        for (symbol, cells) in &self.columns {
            hasher.update(symbol.as_str().as_bytes());
            for cell in cells {
                match cell {
                    Some(v) => {
                        hasher.update(&[1]);
                        hasher.update(&v.to_le_bytes());
                    }
                    None => {
                        hasher.update(&[0]);
                    }
                }
            }
        }
        hasher.finalize().to_hex().to_string()
    }
}
