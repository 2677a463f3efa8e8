//! Descriptive statistics over the raw table, missing cells excluded.

use serde::{Deserialize, Serialize};

/// Count, mean, sample standard deviation, extremes, and quartiles.
///
/// Every field but `count` is `None` when there are no observations;
/// `std` additionally needs at least two.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

impl SummaryStats {
    pub fn compute(cells: &[Option<f64>]) -> Self {
        let mut values: Vec<f64> = cells.iter().flatten().copied().collect();
        values.sort_by(|a, b| a.total_cmp(b));

        let count = values.len();
        let mean = (count > 0).then(|| values.iter().sum::<f64>() / count as f64);
        let std = match mean {
            Some(m) if count > 1 => {
                let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
                Some((ss / (count - 1) as f64).sqrt())
            }
            _ => None,
        };

        Self {
            count,
            mean,
            std,
            min: values.first().copied(),
            q25: quantile_sorted(&values, 0.25),
            median: quantile_sorted(&values, 0.50),
            q75: quantile_sorted(&values, 0.75),
            max: values.last().copied(),
        }
    }
}

/// Number of missing cells in a column.
pub fn missing_count(cells: &[Option<f64>]) -> usize {
    cells.iter().filter(|c| c.is_none()).count()
}

/// Linear-interpolation quantile of an ascending slice.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}
