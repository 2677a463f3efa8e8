//! StockDash CLI: analyze a stock selection from the terminal.
//!
//! Commands:
//! - `analyze`: fetch prices (live, falling back to the sample CSV), compute
//!   metrics, print them, optionally export artifacts
//! - `sample`: print the effective configuration as TOML

mod render;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use stockdash_core::Symbol;
use stockdash_runner::{save_artifacts, DashboardConfig, Session};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stockdash", about = "StockDash: stock price metrics and portfolio returns")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch prices and print summary statistics, moving averages and portfolio returns.
    Analyze {
        /// Symbols to analyze (e.g., AAPL TSLA). Defaults to the configured selection.
        symbols: Vec<String>,

        /// Start date (YYYY-MM-DD). Defaults to the configured lookback before --end.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Fallback CSV. Overrides `data.fallback_csv`.
        #[arg(long)]
        fallback: Option<PathBuf>,

        /// Offline mode: serve everything from the fallback CSV.
        #[arg(long, default_value_t = false)]
        offline: bool,

        /// Write CSV/JSON artifacts into this directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Print the full analysis as JSON instead of tables.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the effective configuration as TOML.
    Sample {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            symbols,
            start,
            end,
            config,
            fallback,
            offline,
            output_dir,
            json,
        } => run_analyze(
            symbols, start, end, config, fallback, offline, output_dir, json,
        ),
        Commands::Sample { config } => run_sample(config),
    }
}

/// Console logging to stderr, filtered by `RUST_LOG` (default `info`).
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<DashboardConfig> {
    match path {
        Some(p) => DashboardConfig::from_file(p)
            .with_context(|| format!("failed to load config {}", p.display())),
        None => Ok(DashboardConfig::default()),
    }
}

fn parse_date(raw: &str, flag: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("{flag}: expected YYYY-MM-DD, got '{raw}'"))
}

#[allow(clippy::too_many_arguments)]
fn run_analyze(
    symbols: Vec<String>,
    start: Option<String>,
    end: Option<String>,
    config_path: Option<PathBuf>,
    fallback: Option<PathBuf>,
    offline: bool,
    output_dir: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let mut config = load_config(config_path.as_ref())?;
    if let Some(path) = fallback {
        config.data.fallback_csv = path;
    }
    if offline {
        config.data.offline = true;
    }
    if output_dir.is_some() {
        config.output.dir = output_dir;
    }

    let selection = if symbols.is_empty() {
        config.selected_symbols()?
    } else {
        Symbol::parse_all(&symbols)?
    };
    if selection.is_empty() {
        println!("Please select at least one stock.");
        return Ok(());
    }
    for symbol in config.outside_universe(&selection) {
        tracing::warn!(%symbol, "symbol is not in the configured universe");
    }

    let end_date = match end.as_deref() {
        Some(raw) => parse_date(raw, "--end")?,
        None => chrono::Local::now().date_naive(),
    };
    let start_date = match start.as_deref() {
        Some(raw) => parse_date(raw, "--start")?,
        None => config.date_range(end_date).0,
    };
    if start_date > end_date {
        bail!("--start ({start_date}) is after --end ({end_date})");
    }

    tracing::debug!(
        symbols = selection.len(),
        start = %start_date,
        end = %end_date,
        offline = config.data.offline,
        "analyze request"
    );
    let mut session = Session::from_config(&config)?;
    let Some(analysis) = session.analyze(&selection, start_date, end_date)? else {
        println!("Please select at least one stock.");
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        print!("{}", render::render_analysis(&analysis));
    }

    if let Some(dir) = &config.output.dir {
        let written = save_artifacts(&analysis, dir)?;
        eprintln!("Artifacts saved to: {} ({} files)", dir.display(), written.len());
    }

    Ok(())
}

fn run_sample(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path.as_ref())?;
    print!("{}", config.to_toml()?);
    Ok(())
}
