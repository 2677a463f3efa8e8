//! Dashboard configuration loaded from TOML.
//!
//! Every section is optional; missing keys take the defaults below. CLI flags
//! override the loaded values at the call site.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use stockdash_core::data::{CircuitBreaker, YahooConfig};
use stockdash_core::{MetricsConfig, Symbol};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Upper bound for `selection.lookback_days` (a century).
pub const MAX_LOOKBACK_DAYS: u32 = 36_500;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    pub selection: SelectionConfig,
    pub data: DataConfig,
    pub provider: ProviderConfig,
    pub metrics: MetricsConfig,
    pub output: OutputConfig,
}

/// Which tickers to analyze and over what window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SelectionConfig {
    /// Tickers analyzed when none are given on the command line.
    pub symbols: Vec<String>,
    /// Days before today used as the default start date.
    pub lookback_days: u32,
    /// Tickers offered for selection.
    pub universe: Vec<String>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            symbols: vec!["AAPL".into(), "TSLA".into()],
            lookback_days: 365,
            universe: ["AAPL", "TSLA", "MSFT", "GOOGL", "AMZN"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    /// Static dataset used when the live source fails.
    pub fallback_csv: PathBuf,
    /// Skip the live source entirely.
    pub offline: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            fallback_csv: PathBuf::from("data/sample_stock_data.csv"),
            offline: false,
        }
    }
}

/// Live provider HTTP, retry, and circuit breaker settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderConfig {
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub cooldown_secs: u64,
    pub failure_threshold: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 3,
            base_delay_ms: 500,
            cooldown_secs: 30 * 60,
            failure_threshold: 3,
        }
    }
}

impl ProviderConfig {
    pub fn yahoo(&self) -> YahooConfig {
        YahooConfig {
            timeout: std::time::Duration::from_secs(self.timeout_secs),
            max_retries: self.max_retries,
            base_delay: std::time::Duration::from_millis(self.base_delay_ms),
            ..YahooConfig::default()
        }
    }

    pub fn circuit_breaker(&self) -> Arc<CircuitBreaker> {
        Arc::new(CircuitBreaker::new(
            std::time::Duration::from_secs(self.cooldown_secs),
            self.failure_threshold,
        ))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// When set, raw/processed tables and metrics are written here.
    pub dir: Option<PathBuf>,
}

impl DashboardConfig {
    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.metrics.short_window == 0 || self.metrics.long_window == 0 {
            return Err(ConfigError::Invalid(
                "moving-average windows must be at least 1".into(),
            ));
        }
        if self.data.fallback_csv.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("data.fallback_csv must not be empty".into()));
        }
        if self.selection.lookback_days > MAX_LOOKBACK_DAYS {
            return Err(ConfigError::Invalid(format!(
                "selection.lookback_days must be at most {MAX_LOOKBACK_DAYS}"
            )));
        }
        let selected = self.selected_symbols()?;
        Symbol::parse_all(&self.selection.universe)
            .map_err(|e| ConfigError::Invalid(format!("selection.universe: {e}")))?;
        if let Some(outside) = self.outside_universe(&selected).first() {
            return Err(ConfigError::Invalid(format!(
                "selection.symbols: {outside} is not in selection.universe"
            )));
        }
        Ok(())
    }

    /// Symbols not offered by `selection.universe`, in input order. An empty
    /// universe offers everything.
    pub fn outside_universe(&self, symbols: &[Symbol]) -> Vec<Symbol> {
        let universe = &self.selection.universe;
        if universe.is_empty() {
            return Vec::new();
        }
        symbols
            .iter()
            .filter(|s| !universe.iter().any(|u| u.trim() == s.as_str()))
            .cloned()
            .collect()
    }

    /// Default symbols from the selection section.
    pub fn selected_symbols(&self) -> Result<Vec<Symbol>, ConfigError> {
        Symbol::parse_all(&self.selection.symbols)
            .map_err(|e| ConfigError::Invalid(format!("selection.symbols: {e}")))
    }

    /// Default `[start, end]` ending at `today`.
    ///
    /// Saturates at the earliest representable date.
    pub fn date_range(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let start = today
            .checked_sub_days(Days::new(u64::from(self.selection.lookback_days)))
            .unwrap_or(NaiveDate::MIN);
        (start, today)
    }
}
