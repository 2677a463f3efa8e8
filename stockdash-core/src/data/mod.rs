//! Data acquisition: live source, static fallback, and session memoization.

pub mod cache;
pub mod circuit_breaker;
pub mod fallback;
pub mod feed;
pub mod provider;
pub mod yahoo;

pub use cache::{FetchCache, FetchKey};
pub use circuit_breaker::CircuitBreaker;
pub use fallback::{CsvFallback, FallbackStore};
pub use feed::{FetchOutcome, PriceFeed};
pub use provider::{DataError, DataProvider, DataSource, FetchResult, PricePoint};
pub use yahoo::{YahooConfig, YahooProvider};
