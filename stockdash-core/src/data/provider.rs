//! Live data provider trait and structured error types.
//!
//! The `DataProvider` trait abstracts over live per-symbol sources so the feed
//! can be exercised with mocks in tests. The fallback dataset sits beside it,
//! behind [`FallbackStore`](super::FallbackStore).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Symbol;

/// One adjusted-close observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub adj_close: f64,
}

/// Structured error types for data operations.
///
/// Displayable in CLI output. Only `FallbackUnavailable` is fatal to a run;
/// the others trigger fallback substitution inside the feed.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("invalid symbol: {0:?}")]
    InvalidSymbol(String),

    #[error("invalid price table: {0}")]
    InvalidTable(String),

    #[error("sample data not found at {location}: {reason}; create the fallback CSV or point the config at one")]
    FallbackUnavailable { location: String, reason: String },

    #[error("data error: {0}")]
    Other(String),
}

impl DataError {
    /// Whether the error concerns a single symbol rather than the source as a whole.
    pub fn is_symbol_scoped(&self) -> bool {
        matches!(self, DataError::SymbolNotFound { .. })
    }
}

/// Result of a successful live fetch for a single symbol.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub symbol: Symbol,
    pub points: Vec<PricePoint>,
}

/// Where a price table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Live,
    Fallback,
}

impl DataSource {
    pub fn label(&self) -> &'static str {
        match self {
            DataSource::Live => "live",
            DataSource::Fallback => "sample CSV",
        }
    }
}

/// Trait for live data providers (Yahoo Finance, mocks).
///
/// Implementations handle the specifics of one remote source. Memoization and
/// fallback sit above this trait; providers know about neither.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily adjusted closes for a symbol over `[start, end]`.
    fn fetch(&self, symbol: &Symbol, start: NaiveDate, end: NaiveDate)
        -> Result<FetchResult, DataError>;

    /// Whether the provider is currently accepting requests.
    fn is_available(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_symbol_not_found_is_symbol_scoped() {
        assert!(DataError::SymbolNotFound { symbol: "X".into() }.is_symbol_scoped());
        assert!(!DataError::NetworkUnreachable("down".into()).is_symbol_scoped());
        assert!(!DataError::CircuitBreakerTripped.is_symbol_scoped());
    }

    #[test]
    fn fallback_unavailable_message_is_actionable() {
        let e = DataError::FallbackUnavailable {
            location: "data/sample.csv".into(),
            reason: "No such file".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("data/sample.csv"));
        assert!(msg.contains("create the fallback CSV"));
    }
}
