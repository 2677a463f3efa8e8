use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A sparse dated series holding only defined points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

impl Series {
    /// Keep the defined cells of a table-aligned column.
    pub fn from_aligned(dates: &[NaiveDate], cells: &[Option<f64>]) -> Self {
        let (dates, values) = dates
            .iter()
            .zip(cells)
            .filter_map(|(d, c)| c.map(|v| (*d, v)))
            .unzip();
        Self { dates, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn last(&self) -> Option<(NaiveDate, f64)> {
        Some((*self.dates.last()?, *self.values.last()?))
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }
}
