//! Analysis session: one fetch → compute pass per request.
//!
//! A `Session` owns the memoization cache for its lifetime, so repeated
//! requests for the same symbols and range reuse the first fetch. Sessions
//! are single-threaded; run one request at a time.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockdash_core::data::{
    CsvFallback, DataError, DataSource, FetchCache, PriceFeed, YahooProvider,
};
use stockdash_core::{compute_metrics_with, Advisory, Metrics, MetricsConfig, PriceTable, Symbol};

use crate::config::{ConfigError, DashboardConfig};

/// Current schema version for persisted analysis artifacts.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] DataError),
}

/// What the caller asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub symbols: Vec<Symbol>,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Complete result of one analysis request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub schema_version: u32,
    pub request: AnalysisRequest,
    pub source: DataSource,
    pub table: PriceTable,
    pub metrics: Metrics,
    /// Non-fatal conditions, in pipeline order: fallback, missing symbols, metrics.
    pub advisories: Vec<Advisory>,
    /// BLAKE3 hash of `table`.
    pub dataset_hash: String,
}

impl Analysis {
    pub fn used_fallback(&self) -> bool {
        self.source == DataSource::Fallback
    }
}

pub struct Session {
    feed: PriceFeed,
    cache: FetchCache,
    metrics: MetricsConfig,
}

impl Session {
    pub fn new(feed: PriceFeed, metrics: MetricsConfig) -> Self {
        Self {
            feed,
            cache: FetchCache::new(),
            metrics,
        }
    }

    /// Build a session from configuration: Yahoo live source (unless
    /// offline) backed by the configured fallback CSV.
    pub fn from_config(config: &DashboardConfig) -> Result<Self, RunError> {
        config.validate()?;
        let fallback = Box::new(CsvFallback::new(&config.data.fallback_csv));
        let feed = if config.data.offline {
            PriceFeed::offline(fallback)
        } else {
            let provider = YahooProvider::new(
                config.provider.yahoo(),
                config.provider.circuit_breaker(),
            )?;
            PriceFeed::new(Box::new(provider), fallback)
        };
        Ok(Self::new(feed, config.metrics))
    }

    pub fn cache(&self) -> &FetchCache {
        &self.cache
    }

    /// Run one request.
    ///
    /// An empty symbol list is a no-op and returns `Ok(None)` without touching
    /// any data source. A missing fallback dataset is the only error; in that
    /// case no metrics are produced.
    pub fn analyze(
        &mut self,
        symbols: &[Symbol],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<Analysis>, RunError> {
        if symbols.is_empty() {
            tracing::info!("no symbols selected; nothing to analyze");
            return Ok(None);
        }

        let outcome = self.feed.fetch(&mut self.cache, symbols, start, end)?;
        let metrics = compute_metrics_with(&outcome.table, &self.metrics);

        let mut advisories = Vec::new();
        if let Some(reason) = &outcome.fallback_reason {
            advisories.push(Advisory::UsedFallback {
                reason: reason.clone(),
            });
        }
        advisories.extend(
            outcome
                .missing
                .iter()
                .map(|symbol| Advisory::SymbolMissing {
                    symbol: symbol.clone(),
                }),
        );
        advisories.extend(metrics.advisories.iter().cloned());

        let dataset_hash = outcome.table.dataset_hash();
        Ok(Some(Analysis {
            schema_version: SCHEMA_VERSION,
            request: AnalysisRequest {
                symbols: symbols.to_vec(),
                start,
                end,
            },
            source: outcome.source,
            table: outcome.table,
            metrics,
            advisories,
            dataset_hash,
        }))
    }
}
