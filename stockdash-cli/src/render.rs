//! Plain-text rendering of an analysis for the terminal.

use std::fmt::Write;

use stockdash_core::metrics::SummaryStats;
use stockdash_core::Advisory;
use stockdash_runner::Analysis;

fn num(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.2}")).unwrap_or_else(|| "-".into())
}

fn advisory_line(advisory: &Advisory) -> String {
    match advisory {
        Advisory::UsedFallback { .. } => format!("Warning: {advisory}"),
        Advisory::NoValidSymbols | Advisory::SymbolMissing { .. } => format!("Note: {advisory}"),
    }
}

fn summary_row(symbol: &str, s: &SummaryStats, missing: usize) -> String {
    format!(
        "{:<8} {:>6} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>8}",
        symbol,
        s.count,
        num(s.mean),
        num(s.std),
        num(s.min),
        num(s.q25),
        num(s.median),
        num(s.q75),
        num(s.max),
        missing
    )
}

pub fn render_analysis(analysis: &Analysis) -> String {
    let mut out = String::new();
    let m = &analysis.metrics;

    let _ = writeln!(
        out,
        "Source: {}  ({} to {}, {} rows)",
        analysis.source.label(),
        analysis.request.start,
        analysis.request.end,
        analysis.table.len()
    );
    for advisory in &analysis.advisories {
        let _ = writeln!(out, "{}", advisory_line(advisory));
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Summary statistics");
    let _ = writeln!(
        out,
        "{:<8} {:>6} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>8}",
        "Symbol", "Count", "Mean", "Std", "Min", "25%", "50%", "75%", "Max", "Missing"
    );
    let _ = writeln!(out, "{}", "-".repeat(102));
    for (symbol, stats) in &m.summary {
        let missing = m.missing.get(symbol).copied().unwrap_or(0);
        let _ = writeln!(out, "{}", summary_row(symbol.as_str(), stats, missing));
    }

    if !m.moving_averages.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Latest moving averages");
        for (symbol, ma) in &m.moving_averages {
            let short = ma.short.last().map(|(_, v)| v);
            let long = ma.long.last().map(|(_, v)| v);
            let _ = writeln!(
                out,
                "{:<8} MA{:<4} {:>10}   MA{:<4} {:>10}",
                symbol.as_str(),
                ma.short_window,
                num(short),
                ma.long_window,
                num(long)
            );
        }
    }

    if let Some(p) = &m.portfolio {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Equal-weight portfolio ({} symbols), cumulative return",
            p.weights.len()
        );
        for (date, cumulative) in p.cumulative.iter() {
            let _ = writeln!(out, "{date}  {:>9.2}%", cumulative * 100.0);
        }
    }

    out
}
