//! Price feed: live source first, static dataset on any failure.
//!
//! Fallback policy for one request:
//! 1. If the session cache holds this exact request, return it untouched
//! 2. Fetch every requested symbol from the live provider; a symbol the
//!    provider does not know is dropped, any other error aborts the attempt
//! 3. If the attempt failed or produced an empty table, or the feed is
//!    offline, load the fallback dataset and restrict it to the requested
//!    symbols and range
//! 4. If the fallback cannot be loaded, fail; nothing is cached

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::cache::{FetchCache, FetchKey};
use super::fallback::FallbackStore;
use super::provider::{DataError, DataProvider, DataSource};
use crate::domain::{PriceTable, Symbol};

/// The table handed to the metrics pipeline, with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchOutcome {
    pub table: PriceTable,
    pub source: DataSource,
    /// Why the live source was abandoned, when `source` is `Fallback`.
    pub fallback_reason: Option<String>,
    /// Requested symbols with no column in `table`, in request order.
    pub missing: Vec<Symbol>,
}

impl FetchOutcome {
    pub fn used_fallback(&self) -> bool {
        self.source == DataSource::Fallback
    }
}

const OFFLINE_REASON: &str = "offline mode";
const EMPTY_LIVE_REASON: &str = "live source returned no data";

pub struct PriceFeed {
    live: Option<Box<dyn DataProvider>>,
    fallback: Box<dyn FallbackStore>,
}

impl PriceFeed {
    pub fn new(live: Box<dyn DataProvider>, fallback: Box<dyn FallbackStore>) -> Self {
        Self {
            live: Some(live),
            fallback,
        }
    }

    /// A feed that never touches the network.
    pub fn offline(fallback: Box<dyn FallbackStore>) -> Self {
        Self {
            live: None,
            fallback,
        }
    }

    pub fn is_offline(&self) -> bool {
        self.live.is_none()
    }

    /// Fetch adjusted closes for `symbols` over `[start, end]`.
    ///
    /// Repeated calls with the same symbol set and range are served from
    /// `cache` without contacting the live source.
    pub fn fetch(
        &self,
        cache: &mut FetchCache,
        symbols: &[Symbol],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchOutcome, DataError> {
        let key = FetchKey::new(symbols, start, end);
        if let Some(hit) = cache.get(&key) {
            tracing::debug!(symbols = key.symbols.len(), %start, %end, "fetch served from session cache");
            return Ok(hit.clone());
        }

        let live = match self.live.as_deref() {
            Some(provider) => Self::fetch_live(provider, &key),
            None => Err(OFFLINE_REASON.to_string()),
        };
        let (table, source, fallback_reason) = match live {
            Ok(table) => (table, DataSource::Live, None),
            Err(reason) => (
                self.load_fallback(&key, &reason)?,
                DataSource::Fallback,
                Some(reason),
            ),
        };

        let missing = table.missing_from(symbols);
        for symbol in &missing {
            tracing::warn!(%symbol, "requested symbol absent from price table");
        }
        tracing::info!(
            source = source.label(),
            rows = table.len(),
            columns = table.width(),
            "price table ready"
        );

        let outcome = FetchOutcome {
            table,
            source,
            fallback_reason,
            missing,
        };
        cache.insert(key, outcome.clone());
        Ok(outcome)
    }

    /// Live attempt. `Err` carries the reason to record when falling back.
    fn fetch_live(provider: &dyn DataProvider, key: &FetchKey) -> Result<PriceTable, String> {
        if !provider.is_available() {
            return Err(DataError::CircuitBreakerTripped.to_string());
        }

        let mut series = BTreeMap::new();
        for symbol in &key.symbols {
            match provider.fetch(symbol, key.start, key.end) {
                Ok(result) => {
                    let points = result
                        .points
                        .into_iter()
                        .map(|p| (p.date, p.adj_close))
                        .collect();
                    series.insert(symbol.clone(), points);
                }
                Err(e) if e.is_symbol_scoped() => {
                    tracing::warn!(%symbol, provider = provider.name(), error = %e, "dropping symbol");
                }
                Err(e) => return Err(e.to_string()),
            }
        }

        let table = PriceTable::from_series(series).restrict(&key.symbols, key.start, key.end);
        if table.is_empty() {
            return Err(EMPTY_LIVE_REASON.to_string());
        }
        Ok(table)
    }

    fn load_fallback(&self, key: &FetchKey, reason: &str) -> Result<PriceTable, DataError> {
        tracing::warn!(%reason, location = %self.fallback.location(), "using fallback dataset");
        let full = self.fallback.load()?;
        Ok(full.restrict(&key.symbols, key.start, key.end))
    }
}
