//! Non-fatal conditions reported alongside normal output.
//!
//! Advisories never abort a run. The only fatal condition in the pipeline is
//! [`DataError::FallbackUnavailable`](crate::data::DataError::FallbackUnavailable).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::Symbol;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Advisory {
    /// The live source failed or returned nothing; the static dataset was used.
    UsedFallback { reason: String },
    /// No symbol in the table could take part in the portfolio computation.
    NoValidSymbols,
    /// A requested symbol is absent from the price table.
    SymbolMissing { symbol: Symbol },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::UsedFallback { reason } => {
                write!(f, "live data unavailable ({reason}); using sample data")
            }
            Advisory::NoValidSymbols => write!(f, "no valid tickers for portfolio simulation"),
            Advisory::SymbolMissing { symbol } => {
                write!(f, "{symbol} is not present in the price data and was skipped")
            }
        }
    }
}
