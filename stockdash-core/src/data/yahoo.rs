//! Yahoo Finance live provider.
//!
//! Fetches daily adjusted closes from Yahoo's v8 chart API. Handles rate
//! limiting, retries with exponential backoff, response parsing, and the
//! circuit breaker.
//!
//! Yahoo Finance has no official API and is subject to unannounced format
//! changes. Any failure here is absorbed by the feed, which substitutes the
//! static fallback dataset.

use super::circuit_breaker::CircuitBreaker;
use super::provider::{DataError, DataProvider, FetchResult, PricePoint};
use crate::domain::Symbol;
use chrono::{Days, NaiveDate, NaiveTime};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    adjclose: Vec<Option<f64>>,
}

/// HTTP and retry settings for the Yahoo provider.
#[derive(Debug, Clone)]
pub struct YahooConfig {
    pub timeout: Duration,
    pub max_retries: u32,
    pub base_delay: Duration,
    pub user_agent: String,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".into(),
        }
    }
}

pub struct YahooProvider {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    max_retries: u32,
    base_delay: Duration,
    /// Longest single wait between attempts.
    max_delay: Duration,
}

impl YahooProvider {
    pub fn new(config: YahooConfig, circuit_breaker: Arc<CircuitBreaker>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            circuit_breaker,
            max_retries: config.max_retries,
            base_delay: config.base_delay,
            max_delay: config.timeout,
        })
    }

    /// Chart API URL. `period2` is the midnight after `end`, so `end` is included.
    fn chart_url(symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        let start_ts = start.and_time(NaiveTime::MIN).and_utc().timestamp();
        let end_ts = end
            .checked_add_days(Days::new(1))
            .unwrap_or(end)
            .and_time(NaiveTime::MIN)
            .and_utc()
            .timestamp();
        format!(
            "https://query2.finance.yahoo.com/v8/finance/chart/{symbol}\
             ?period1={start_ts}&period2={end_ts}&interval=1d\
             &includeAdjustedClose=true"
        )
    }

    /// Parse a chart response into adjusted-close points inside `[start, end]`.
    ///
    /// Uses the adjusted series when present and the raw close otherwise.
    /// Days with no price (holidays, halts) are skipped.
    fn parse_response(
        symbol: &str,
        resp: ChartResponse,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, DataError> {
        let result = resp.chart.result.ok_or_else(|| {
            if let Some(err) = resp.chart.error {
                if err.code == "Not Found" {
                    DataError::SymbolNotFound {
                        symbol: symbol.to_string(),
                    }
                } else {
                    DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
                }
            } else {
                DataError::ResponseFormatChanged("empty result with no error".into())
            }
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

        // No timestamps means no trading days in the window.
        let timestamps = data.timestamp.unwrap_or_default();

        let closes = data
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|q| q.close)
            .unwrap_or_default();

        let adj_closes = data
            .indicators
            .adjclose
            .and_then(|v| v.into_iter().next())
            .map(|a| a.adjclose);

        let mut points = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.naive_utc().date())
                .ok_or_else(|| {
                    DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
                })?;

            if date < start || date > end {
                continue;
            }

            let price = match &adj_closes {
                Some(adj) => adj.get(i).copied().flatten(),
                None => closes.get(i).copied().flatten(),
            };

            if let Some(adj_close) = price.filter(|p| p.is_finite()) {
                points.push(PricePoint { date, adj_close });
            }
        }

        if points.is_empty() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }

        points.sort_by_key(|p| p.date);
        points.dedup_by_key(|p| p.date);
        Ok(points)
    }

    /// One HTTP round trip, classified for the retry loop.
    fn attempt(&self, url: &str, symbol: &str) -> Attempt {
        let resp = match self.client.get(url).send() {
            Ok(resp) => resp,
            Err(e) if e.is_connect() || e.is_timeout() => {
                return Attempt::Retry(DataError::NetworkUnreachable(e.to_string()))
            }
            Err(e) => return Attempt::Fail(DataError::NetworkUnreachable(e.to_string())),
        };

        let status = resp.status();
        match classify_status(status, symbol) {
            StatusClass::Ok => {}
            StatusClass::Blocked => {
                self.circuit_breaker.trip();
                return Attempt::Fail(DataError::CircuitBreakerTripped);
            }
            StatusClass::Throttled => {
                self.circuit_breaker.record_failure();
                let retry_after_secs = resp
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                return Attempt::Retry(DataError::RateLimited { retry_after_secs });
            }
            StatusClass::Transient(err) => {
                self.circuit_breaker.record_failure();
                return Attempt::Retry(err);
            }
            StatusClass::Fatal(err) => return Attempt::Fail(err),
        }

        match resp.json::<ChartResponse>() {
            Ok(chart) => Attempt::Done(chart),
            Err(e) => Attempt::Fail(DataError::ResponseFormatChanged(format!(
                "{symbol}: undecodable chart payload: {e}"
            ))),
        }
    }

    /// Fetch with retries, waiting [`retry_delay`] between attempts.
    /// The breaker is consulted before every attempt.
    fn fetch_with_retry(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, DataError> {
        let url = Self::chart_url(symbol, start, end);
        let mut last_error = DataError::Other(format!("{symbol}: no attempts made"));

        for attempt in 0..=self.max_retries {
            if !self.circuit_breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }
            if attempt > 0 {
                let delay = retry_delay(self.base_delay, self.max_delay, attempt, &last_error);
                tracing::debug!(symbol, attempt, ?delay, error = %last_error, "retrying live fetch");
                std::thread::sleep(delay);
            }

            match self.attempt(&url, symbol) {
                Attempt::Done(chart) => {
                    let points = Self::parse_response(symbol, chart, start, end)?;
                    self.circuit_breaker.record_success();
                    return Ok(points);
                }
                Attempt::Retry(err) => last_error = err,
                Attempt::Fail(err) => return Err(err),
            }
        }

        Err(last_error)
    }
}

/// Wait before retry `attempt` (1-based): the server's `Retry-After` after a
/// 429, otherwise `base * 2^(attempt-1)`. Never longer than `cap`.
fn retry_delay(base: Duration, cap: Duration, attempt: u32, last_error: &DataError) -> Duration {
    let delay = match last_error {
        DataError::RateLimited { retry_after_secs } => Duration::from_secs(*retry_after_secs),
        _ => base.saturating_mul(1 << attempt.saturating_sub(1).min(16)),
    };
    delay.min(cap)
}

enum Attempt {
    Done(ChartResponse),
    Retry(DataError),
    Fail(DataError),
}

enum StatusClass {
    Ok,
    /// 403: the endpoint is refusing us; stop calling it for a while.
    Blocked,
    /// 429
    Throttled,
    Transient(DataError),
    Fatal(DataError),
}

fn classify_status(status: reqwest::StatusCode, symbol: &str) -> StatusClass {
    use reqwest::StatusCode;

    match status {
        s if s.is_success() => StatusClass::Ok,
        StatusCode::FORBIDDEN => StatusClass::Blocked,
        StatusCode::TOO_MANY_REQUESTS => StatusClass::Throttled,
        StatusCode::UNAUTHORIZED => StatusClass::Fatal(DataError::AuthenticationRequired(
            "chart endpoint demanded credentials".into(),
        )),
        StatusCode::NOT_FOUND => StatusClass::Fatal(DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        }),
        s => StatusClass::Transient(DataError::Other(format!("{symbol}: HTTP {s}"))),
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(
        &self,
        symbol: &Symbol,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        let points = self.fetch_with_retry(symbol.as_str(), start, end)?;
        Ok(FetchResult {
            symbol: symbol.clone(),
            points,
        })
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn parse(json: &str, start: &str, end: &str) -> Result<Vec<PricePoint>, DataError> {
        let resp: ChartResponse = serde_json::from_str(json).unwrap();
        YahooProvider::parse_response("AAPL", resp, d(start), d(end))
    }

    // 2024-01-02 14:30 UTC, 2024-01-03 14:30 UTC, 2024-01-04 14:30 UTC
    const THREE_DAYS: &str = r#"{"chart":{"result":[{
        "timestamp":[1704205800,1704292200,1704378600],
        "indicators":{
            "quote":[{"close":[185.6,184.2,181.9]}],
            "adjclose":[{"adjclose":[184.9,null,181.2]}]
        }}],"error":null}}"#;

    #[test]
    fn url_includes_end_date() {
        let url = YahooProvider::chart_url("AAPL", d("2024-01-02"), d("2024-01-02"));
        // 2024-01-02T00:00:00Z and 2024-01-03T00:00:00Z
        assert!(url.contains("period1=1704153600"));
        assert!(url.contains("period2=1704240000"));
        assert!(url.contains("/chart/AAPL?"));
    }

    #[test]
    fn parses_adjusted_close_and_skips_nulls() {
        let points = parse(THREE_DAYS, "2024-01-01", "2024-01-31").unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, d("2024-01-02"));
        assert_eq!(points[0].adj_close, 184.9);
        assert_eq!(points[1].date, d("2024-01-04"));
    }

    #[test]
    fn filters_to_requested_range() {
        let points = parse(THREE_DAYS, "2024-01-03", "2024-01-04").unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].date, d("2024-01-04"));
    }

    #[test]
    fn falls_back_to_close_without_adjclose() {
        let json = r#"{"chart":{"result":[{
            "timestamp":[1704205800],
            "indicators":{"quote":[{"close":[185.6]}]}}],"error":null}}"#;
        let points = parse(json, "2024-01-01", "2024-01-31").unwrap();
        assert_eq!(points[0].adj_close, 185.6);
    }

    #[test]
    fn not_found_error_maps_to_symbol_not_found() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found"}}}"#;
        let err = parse(json, "2024-01-01", "2024-01-31").unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound { .. }));
    }

    #[test]
    fn other_chart_error_is_format_change() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Bad Request","description":"oops"}}}"#;
        let err = parse(json, "2024-01-01", "2024-01-31").unwrap_err();
        assert!(matches!(err, DataError::ResponseFormatChanged(_)));
    }

    #[test]
    fn no_timestamps_is_symbol_not_found() {
        let json = r#"{"chart":{"result":[{"indicators":{"quote":[{}]}}],"error":null}}"#;
        let err = parse(json, "2024-01-01", "2024-01-31").unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound { .. }));
    }

    #[test]
    fn status_classes() {
        use reqwest::StatusCode;

        assert!(matches!(classify_status(StatusCode::OK, "X"), StatusClass::Ok));
        assert!(matches!(classify_status(StatusCode::FORBIDDEN, "X"), StatusClass::Blocked));
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, "X"),
            StatusClass::Throttled
        ));
        assert!(matches!(
            classify_status(StatusCode::NOT_FOUND, "X"),
            StatusClass::Fatal(DataError::SymbolNotFound { .. })
        ));
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, "X"),
            StatusClass::Fatal(DataError::AuthenticationRequired(_))
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_GATEWAY, "X"),
            StatusClass::Transient(DataError::Other(_))
        ));
    }

    #[test]
    fn retry_delay_prefers_retry_after() {
        let base = Duration::from_millis(500);
        let cap = Duration::from_secs(30);
        let limited = DataError::RateLimited {
            retry_after_secs: 7,
        };
        assert_eq!(retry_delay(base, cap, 1, &limited), Duration::from_secs(7));
        assert_eq!(retry_delay(base, cap, 3, &limited), Duration::from_secs(7));

        let long = DataError::RateLimited {
            retry_after_secs: 3600,
        };
        assert_eq!(retry_delay(base, cap, 1, &long), cap);
    }

    #[test]
    fn retry_delay_backs_off_exponentially_otherwise() {
        let base = Duration::from_millis(500);
        let cap = Duration::from_secs(30);
        let err = DataError::NetworkUnreachable("reset".into());
        assert_eq!(retry_delay(base, cap, 1, &err), Duration::from_millis(500));
        assert_eq!(retry_delay(base, cap, 2, &err), Duration::from_secs(1));
        assert_eq!(retry_delay(base, cap, 3, &err), Duration::from_secs(2));
        assert_eq!(retry_delay(base, cap, 20, &err), cap);
    }
}
