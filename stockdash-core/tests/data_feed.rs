//! Integration tests for the live/fallback price feed and its session cache.

mod common;

use common::{d, fixture_csv, sym, syms, Behavior, ScriptedProvider};
use std::sync::atomic::Ordering;
use stockdash_core::data::{CsvFallback, DataError, DataSource, FetchCache, PriceFeed};

fn healthy() -> ScriptedProvider {
    ScriptedProvider::new(Behavior::Healthy)
        .with_series(
            "AAPL",
            &[
                ("2023-12-29", 192.5),
                ("2024-01-02", 185.6),
                ("2024-01-03", 184.2),
                ("2024-01-04", 181.9),
            ],
        )
        .with_series("TSLA", &[("2024-01-02", 248.4), ("2024-01-04", 237.9)])
}

#[test]
fn healthy_live_source_respects_symbols_and_range() {
    let provider = healthy();
    let feed = PriceFeed::new(Box::new(provider), Box::new(CsvFallback::new(fixture_csv())));
    let mut cache = FetchCache::new();

    let requested = syms(&["AAPL", "TSLA", "NFLX"]);
    let out = feed
        .fetch(&mut cache, &requested, d("2024-01-02"), d("2024-01-04"))
        .unwrap();

    assert_eq!(out.source, DataSource::Live);
    assert!(out.fallback_reason.is_none());
    for s in out.table.symbols() {
        assert!(requested.contains(s));
    }
    assert_eq!(out.missing, vec![sym("NFLX")]);

    let dates = out.table.dates();
    assert_eq!(dates.len(), 3);
    assert!(dates.iter().all(|x| *x >= d("2024-01-02") && *x <= d("2024-01-04")));
    assert!(dates.windows(2).all(|w| w[0] < w[1]));

    // TSLA did not trade on 01-03 in the script
    assert_eq!(out.table.column("TSLA").unwrap()[1], None);
}

#[test]
fn live_failure_substitutes_fallback_slice() {
    let provider = ScriptedProvider::new(Behavior::Down);
    let feed = PriceFeed::new(Box::new(provider), Box::new(CsvFallback::new(fixture_csv())));
    let mut cache = FetchCache::new();

    let out = feed
        .fetch(
            &mut cache,
            &syms(&["AAPL", "TSLA", "NFLX"]),
            d("2024-01-03"),
            d("2024-01-09"),
        )
        .unwrap();

    assert!(out.used_fallback());
    assert!(out
        .fallback_reason
        .as_deref()
        .unwrap()
        .contains("network unreachable"));

    let symbols: Vec<_> = out.table.symbols().map(|s| s.as_str()).collect();
    assert_eq!(symbols, vec!["AAPL", "TSLA"]);
    assert_eq!(
        out.table.dates(),
        &[
            d("2024-01-03"),
            d("2024-01-04"),
            d("2024-01-05"),
            d("2024-01-08"),
            d("2024-01-09"),
        ]
    );
    assert_eq!(out.table.column("AAPL").unwrap()[0], Some(183.35));
    // the fixture has a blank TSLA cell on 01-09
    assert_eq!(out.table.column("TSLA").unwrap()[4], None);
    assert_eq!(out.missing, vec![sym("NFLX")]);
}

#[test]
fn empty_live_result_substitutes_fallback() {
    let provider = ScriptedProvider::new(Behavior::Empty);
    let feed = PriceFeed::new(Box::new(provider), Box::new(CsvFallback::new(fixture_csv())));
    let mut cache = FetchCache::new();

    let out = feed
        .fetch(&mut cache, &syms(&["MSFT"]), d("2024-01-01"), d("2024-12-31"))
        .unwrap();

    assert_eq!(out.source, DataSource::Fallback);
    assert_eq!(
        out.fallback_reason.as_deref(),
        Some("live source returned no data")
    );
    assert_eq!(out.table.len(), 10);
    assert!(out.table.contains("MSFT"));
    assert!(out.missing.is_empty());
}

#[test]
fn empty_live_result_and_missing_fallback_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::new(Behavior::Empty);
    let feed = PriceFeed::new(
        Box::new(provider),
        Box::new(CsvFallback::new(dir.path().join("sample_stock_data.csv"))),
    );
    let mut cache = FetchCache::new();

    let err = feed
        .fetch(&mut cache, &syms(&["AAPL"]), d("2024-01-01"), d("2024-12-31"))
        .unwrap_err();

    match err {
        DataError::FallbackUnavailable { location, .. } => {
            assert!(location.ends_with("sample_stock_data.csv"))
        }
        other => panic!("expected FallbackUnavailable, got {other:?}"),
    }
    assert!(cache.is_empty());
}

#[test]
fn repeated_fetch_is_served_from_cache() {
    let provider = healthy();
    let calls = provider.call_counter();
    let feed = PriceFeed::new(Box::new(provider), Box::new(CsvFallback::new(fixture_csv())));
    let mut cache = FetchCache::new();

    let first = feed
        .fetch(&mut cache, &syms(&["AAPL", "TSLA"]), d("2024-01-02"), d("2024-01-04"))
        .unwrap();
    let after_first = calls.load(Ordering::SeqCst);
    assert_eq!(after_first, 2);

    // Same set in a different order is the same request.
    let second = feed
        .fetch(&mut cache, &syms(&["TSLA", "AAPL"]), d("2024-01-02"), d("2024-01-04"))
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(calls.load(Ordering::SeqCst), after_first);
    assert_eq!(cache.hits(), 1);
    assert_eq!(cache.misses(), 1);
}

#[test]
fn different_range_misses_cache() {
    let provider = healthy();
    let calls = provider.call_counter();
    let feed = PriceFeed::new(Box::new(provider), Box::new(CsvFallback::new(fixture_csv())));
    let mut cache = FetchCache::new();

    feed.fetch(&mut cache, &syms(&["AAPL"]), d("2024-01-02"), d("2024-01-04"))
        .unwrap();
    feed.fetch(&mut cache, &syms(&["AAPL"]), d("2024-01-02"), d("2024-01-03"))
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(cache.len(), 2);
}

#[test]
fn fallback_outcome_is_cached_with_its_tag() {
    let provider = ScriptedProvider::new(Behavior::Down);
    let calls = provider.call_counter();
    let feed = PriceFeed::new(Box::new(provider), Box::new(CsvFallback::new(fixture_csv())));
    let mut cache = FetchCache::new();

    let a = feed
        .fetch(&mut cache, &syms(&["AAPL"]), d("2024-01-01"), d("2024-01-31"))
        .unwrap();
    let b = feed
        .fetch(&mut cache, &syms(&["AAPL"]), d("2024-01-01"), d("2024-01-31"))
        .unwrap();

    assert!(a.used_fallback() && b.used_fallback());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn inverted_range_yields_empty_fallback_table() {
    let provider = healthy();
    let feed = PriceFeed::new(Box::new(provider), Box::new(CsvFallback::new(fixture_csv())));
    let mut cache = FetchCache::new();

    let out = feed
        .fetch(&mut cache, &syms(&["AAPL"]), d("2024-01-10"), d("2024-01-02"))
        .unwrap();

    assert!(out.table.is_empty());
    assert!(out.used_fallback());
}

#[test]
fn fallback_column_without_prices_in_range_is_reported_missing() {
    let feed = PriceFeed::offline(Box::new(CsvFallback::new(fixture_csv())));
    let mut cache = FetchCache::new();

    // TSLA is blank on 01-09, the only day in range.
    let out = feed
        .fetch(&mut cache, &syms(&["AAPL", "TSLA"]), d("2024-01-09"), d("2024-01-09"))
        .unwrap();

    assert!(out.used_fallback());
    assert_eq!(out.fallback_reason.as_deref(), Some("offline mode"));
    assert!(out.table.contains("AAPL"));
    assert!(!out.table.contains("TSLA"));
    assert_eq!(out.missing, vec![sym("TSLA")]);
}
