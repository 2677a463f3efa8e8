//! Metrics pipeline: price table in, plain tabular/series data out.
//!
//! Every function here is pure. The pipeline never fails; missing data
//! propagates as "no value" and an unusable symbol set is reported through
//! [`Advisory::NoValidSymbols`].

pub mod moving_average;
pub mod portfolio;
pub mod returns;
pub mod series;
pub mod stats;

pub use moving_average::rolling_mean;
pub use portfolio::{equal_weight_portfolio, PortfolioReturns};
pub use returns::{cumulative_returns, simple_returns};
pub use series::Series;
pub use stats::{missing_count, SummaryStats};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::advisory::Advisory;
use crate::domain::{PriceTable, Symbol};

/// Moving-average window lengths, in observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub short_window: usize,
    pub long_window: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            short_window: 50,
            long_window: 200,
        }
    }
}

/// Short and long moving averages for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingAverages {
    pub short_window: usize,
    pub long_window: usize,
    pub short: Series,
    pub long: Series,
}

/// Everything derived from one price table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub summary: BTreeMap<Symbol, SummaryStats>,
    pub missing: BTreeMap<Symbol, usize>,
    pub moving_averages: BTreeMap<Symbol, MovingAverages>,
    pub returns: BTreeMap<Symbol, Series>,
    pub portfolio: Option<PortfolioReturns>,
    pub advisories: Vec<Advisory>,
}

/// Compute metrics with the default 50/200 windows.
pub fn compute_metrics(table: &PriceTable) -> Metrics {
    compute_metrics_with(table, &MetricsConfig::default())
}

pub fn compute_metrics_with(table: &PriceTable, config: &MetricsConfig) -> Metrics {
    let dates = table.dates();
    let mut summary = BTreeMap::new();
    let mut missing = BTreeMap::new();
    let mut moving_averages = BTreeMap::new();
    let mut returns = BTreeMap::new();
    let mut aligned_returns = BTreeMap::new();

    for (symbol, cells) in table.columns() {
        summary.insert(symbol.clone(), SummaryStats::compute(cells));
        missing.insert(symbol.clone(), missing_count(cells));

        moving_averages.insert(
            symbol.clone(),
            MovingAverages {
                short_window: config.short_window,
                long_window: config.long_window,
                short: Series::from_aligned(dates, &rolling_mean(cells, config.short_window)),
                long: Series::from_aligned(dates, &rolling_mean(cells, config.long_window)),
            },
        );

        let r = simple_returns(cells);
        returns.insert(symbol.clone(), Series::from_aligned(dates, &r));
        aligned_returns.insert(symbol.clone(), r);
    }

    let portfolio = equal_weight_portfolio(dates, &aligned_returns);
    let mut advisories = Vec::new();
    if portfolio.is_none() {
        tracing::warn!("no valid symbols for portfolio computation");
        advisories.push(Advisory::NoValidSymbols);
    }

    Metrics {
        summary,
        missing,
        moving_averages,
        returns,
        portfolio,
        advisories,
    }
}
