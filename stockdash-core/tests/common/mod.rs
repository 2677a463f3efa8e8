//! Shared helpers for core integration tests.

#![allow(dead_code)]

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use stockdash_core::data::{DataError, DataProvider, FetchResult, PricePoint};
use stockdash_core::Symbol;

pub fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn sym(s: &str) -> Symbol {
    Symbol::new(s).unwrap()
}

pub fn syms(names: &[&str]) -> Vec<Symbol> {
    names.iter().map(|n| sym(n)).collect()
}

pub fn fixture_csv() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/sample_stock_data.csv")
}

/// How the scripted live source behaves.
#[derive(Clone)]
pub enum Behavior {
    /// Serve the scripted series.
    Healthy,
    /// Every request fails with a network error.
    Down,
    /// Every symbol is unknown.
    Empty,
}

/// Scripted live source that counts calls.
pub struct ScriptedProvider {
    pub series: BTreeMap<String, Vec<(NaiveDate, f64)>>,
    pub behavior: Behavior,
    pub calls: Arc<AtomicUsize>,
}

impl ScriptedProvider {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            series: BTreeMap::new(),
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_series(mut self, symbol: &str, points: &[(&str, f64)]) -> Self {
        self.series.insert(
            symbol.to_string(),
            points.iter().map(|(date, p)| (d(date), *p)).collect(),
        );
        self
    }

    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

impl DataProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn fetch(
        &self,
        symbol: &Symbol,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::Down => Err(DataError::NetworkUnreachable("connection refused".into())),
            Behavior::Empty => Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            }),
            Behavior::Healthy => {
                let points: Vec<PricePoint> = self
                    .series
                    .get(symbol.as_str())
                    .ok_or_else(|| DataError::SymbolNotFound {
                        symbol: symbol.to_string(),
                    })?
                    .iter()
                    .filter(|(date, _)| *date >= start && *date <= end)
                    .map(|(date, p)| PricePoint {
                        date: *date,
                        adj_close: *p,
                    })
                    .collect();
                Ok(FetchResult {
                    symbol: symbol.clone(),
                    points,
                })
            }
        }
    }

    fn is_available(&self) -> bool {
        true
    }
}
