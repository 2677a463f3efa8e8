//! StockDash Core: price tables, data acquisition, and derived metrics.
//!
//! This crate contains everything between "the user picked some tickers and a
//! date range" and "here are the numbers to render":
//! - Domain types (symbols, the aligned price table)
//! - Data provider: live Yahoo Finance source with a static CSV fallback
//! - Session-owned memoization of fetches
//! - Metrics pipeline: summary statistics, moving averages, simple returns,
//!   equal-weighted portfolio cumulative return
//! - Advisory conditions surfaced alongside normal output
//!
//! No filesystem paths are hardcoded here; the fallback location is supplied
//! by the caller through [`data::FallbackStore`].

pub mod advisory;
pub mod data;
pub mod domain;
pub mod metrics;

pub use advisory::Advisory;
pub use data::{DataError, DataSource, FetchCache, FetchOutcome, PriceFeed};
pub use domain::{PriceTable, Symbol};
pub use metrics::{compute_metrics, compute_metrics_with, Metrics, MetricsConfig};
