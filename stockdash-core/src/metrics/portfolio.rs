//! Equal-weighted portfolio return curve.
//!
//! Weights are `1/N` over the usable symbols: those with at least one
//! defined return. A date contributes to the portfolio only when every usable
//! symbol has a return on it; incomplete dates are dropped rather than
//! reweighted.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::returns::cumulative_returns;
use super::series::Series;
use crate::domain::Symbol;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioReturns {
    pub weights: BTreeMap<Symbol, f64>,
    /// Weighted daily return on each complete date.
    pub daily: Series,
    /// Compounded return from the first complete date.
    pub cumulative: Series,
}

/// Build the portfolio from table-aligned per-symbol returns.
///
/// Returns `None` when no symbol has a return, or when no date has a return
/// for every usable symbol.
pub fn equal_weight_portfolio(
    dates: &[NaiveDate],
    returns: &BTreeMap<Symbol, Vec<Option<f64>>>,
) -> Option<PortfolioReturns> {
    let usable: Vec<(&Symbol, &Vec<Option<f64>>)> = returns
        .iter()
        .filter(|(_, col)| col.iter().any(Option::is_some))
        .collect();
    if usable.is_empty() {
        return None;
    }

    let weight = 1.0 / usable.len() as f64;
    let weights: BTreeMap<Symbol, f64> = usable
        .iter()
        .map(|(s, _)| ((*s).clone(), weight))
        .collect();

    let mut daily = Series::default();
    for (t, date) in dates.iter().enumerate() {
        let day: Option<f64> = usable
            .iter()
            .map(|(_, col)| col.get(t).copied().flatten().map(|r| r * weight))
            .sum();
        if let Some(r) = day {
            daily.dates.push(*date);
            daily.values.push(r);
        }
    }
    if daily.is_empty() {
        return None;
    }

    let cumulative = Series {
        dates: daily.dates.clone(),
        values: cumulative_returns(&daily.values),
    };

    Some(PortfolioReturns {
        weights,
        daily,
        cumulative,
    })
}
