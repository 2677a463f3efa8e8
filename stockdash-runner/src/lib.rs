//! StockDash Runner: request orchestration around `stockdash-core`.
//!
//! This crate provides:
//! - Analysis sessions: fetch, compute, and collect advisories per request
//! - TOML dashboard configuration (selection, fallback location, provider, windows)
//! - CSV and JSON export of price tables and metrics

pub mod config;
pub mod export;
pub mod session;

pub use config::{ConfigError, DashboardConfig};
pub use export::save_artifacts;
pub use session::{Analysis, AnalysisRequest, RunError, Session};
