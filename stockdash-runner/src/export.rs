//! Export of price tables and metrics: the storage side of the dashboard.
//!
//! - **CSV**: raw prices, processed prices with moving averages, portfolio
//!   curve, summary statistics
//! - **JSON**: the full `Analysis`, schema-versioned
//!
//! Output locations always come from the caller.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use stockdash_core::metrics::Series;
use stockdash_core::{Metrics, PriceTable};

use crate::session::{Analysis, SCHEMA_VERSION};

fn cell(v: Option<f64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

fn stat(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.6}")).unwrap_or_default()
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

fn by_date(series: &Series) -> HashMap<NaiveDate, f64> {
    series.iter().collect()
}

// ─── CSV export ─────────────────────────────────────────────────────

/// `Date,<sym>...` with empty cells for missing prices.
///
/// Readable back by the fallback CSV loader.
pub fn export_prices_csv(table: &PriceTable) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec!["Date".to_string()];
    header.extend(table.symbols().map(|s| s.to_string()));
    wtr.write_record(&header)?;

    for (i, date) in table.dates().iter().enumerate() {
        let mut row = vec![date.to_string()];
        row.extend(table.columns().values().map(|col| cell(col[i])));
        wtr.write_record(&row)?;
    }

    finish(wtr)
}

/// Prices plus `<sym>_MA<short>` and `<sym>_MA<long>` columns.
pub fn export_processed_csv(table: &PriceTable, metrics: &Metrics) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec!["Date".to_string()];
    let mut lookups = Vec::new();
    for symbol in table.symbols() {
        header.push(symbol.to_string());
        if let Some(ma) = metrics.moving_averages.get(symbol) {
            header.push(format!("{symbol}_MA{}", ma.short_window));
            header.push(format!("{symbol}_MA{}", ma.long_window));
            lookups.push(Some((by_date(&ma.short), by_date(&ma.long))));
        } else {
            lookups.push(None);
        }
    }
    wtr.write_record(&header)?;

    for (i, date) in table.dates().iter().enumerate() {
        let mut row = vec![date.to_string()];
        for (col, lookup) in table.columns().values().zip(&lookups) {
            row.push(cell(col[i]));
            if let Some((short, long)) = lookup {
                row.push(cell(short.get(date).copied()));
                row.push(cell(long.get(date).copied()));
            }
        }
        wtr.write_record(&row)?;
    }

    finish(wtr)
}

/// `Date,daily_return,cumulative_return`; header only when there is no portfolio.
pub fn export_portfolio_csv(metrics: &Metrics) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["Date", "daily_return", "cumulative_return"])?;

    if let Some(p) = &metrics.portfolio {
        for ((date, daily), cumulative) in p.daily.iter().zip(p.cumulative.values.iter()) {
            wtr.write_record([
                date.to_string(),
                format!("{daily:.8}"),
                format!("{cumulative:.8}"),
            ])?;
        }
    }

    finish(wtr)
}

/// One row per symbol: describe-style statistics and the missing count.
pub fn export_summary_csv(metrics: &Metrics) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "symbol", "count", "mean", "std", "min", "25%", "50%", "75%", "max", "missing",
    ])?;

    for (symbol, s) in &metrics.summary {
        let missing = metrics.missing.get(symbol).copied().unwrap_or(0);
        wtr.write_record([
            symbol.to_string(),
            s.count.to_string(),
            stat(s.mean),
            stat(s.std),
            stat(s.min),
            stat(s.q25),
            stat(s.median),
            stat(s.q75),
            stat(s.max),
            missing.to_string(),
        ])?;
    }

    finish(wtr)
}

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(analysis: &Analysis) -> Result<String> {
    serde_json::to_string_pretty(analysis).context("failed to serialize Analysis to JSON")
}

/// Deserialize an `Analysis`, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<Analysis> {
    let analysis: Analysis =
        serde_json::from_str(json).context("failed to deserialize Analysis from JSON")?;
    if analysis.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            analysis.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(analysis)
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Write the full artifact set for one analysis into `output_dir`:
/// - `raw_stock_data.csv`
/// - `processed_stock_data.csv`
/// - `portfolio_returns.csv`
/// - `summary.csv`
/// - `analysis.json`
///
/// Returns the written paths.
pub fn save_artifacts(analysis: &Analysis, output_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir: {}", output_dir.display()))?;

    let artifacts = [
        ("raw_stock_data.csv", export_prices_csv(&analysis.table)?),
        (
            "processed_stock_data.csv",
            export_processed_csv(&analysis.table, &analysis.metrics)?,
        ),
        ("portfolio_returns.csv", export_portfolio_csv(&analysis.metrics)?),
        ("summary.csv", export_summary_csv(&analysis.metrics)?),
        ("analysis.json", export_json(analysis)?),
    ];

    let mut written = Vec::with_capacity(artifacts.len());
    for (name, content) in artifacts {
        let path = output_dir.join(name);
        std::fs::write(&path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        written.push(path);
    }

    tracing::info!(dir = %output_dir.display(), files = written.len(), "artifacts saved");
    Ok(written)
}
