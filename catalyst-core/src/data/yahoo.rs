//! Yahoo Finance price provider.
//!
//! Reads the v8 chart API with a one-day range: `meta.regularMarketPrice` is the
//! current price, the `close` series is the recent daily history. Handles retries
//! with exponential backoff, response parsing, and the circuit breaker.
//!
//! Yahoo Finance has no official API and is subject to unannounced format changes,
//! so every parse failure maps to `DataError::ResponseFormatChanged`.
//!
//! Both lookups read the same chart. When `current_price` finds no usable quote it
//! parks the chart it downloaded, and the `daily_history` call that follows reads the
//! closes from it instead of requesting the chart again.

use super::circuit_breaker::CircuitBreaker;
use super::provider::{DailyClose, DataError, MarketDataProvider};
use reqwest::Url;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

pub const CHART_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";

/// How long a parked chart stays usable for the history fallback.
const PARKED_CHART_TTL: Duration = Duration::from_secs(30);

/// Yahoo Finance v8 chart API response.
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
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// HTTP settings for the Yahoo provider.
#[derive(Debug, Clone)]
pub struct YahooSettings {
    /// Per-request timeout handed to the HTTP client.
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub base_delay: Duration,
    /// Chart endpoint; the ticker is appended as one path segment.
    pub chart_url: String,
}

impl Default for YahooSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(5),
            max_retries: 2,
            base_delay: Duration::from_millis(250),
            chart_url: CHART_URL.to_string(),
        }
    }
}

/// Yahoo Finance price provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    settings: YahooSettings,
    parked: Mutex<HashMap<String, (Instant, ChartData)>>,
}

impl YahooProvider {
    pub fn new(circuit_breaker: Arc<CircuitBreaker>, settings: YahooSettings) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(settings.request_timeout)
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            circuit_breaker,
            settings,
            parked: Mutex::new(HashMap::new()),
        })
    }

    /// Chart URL for one symbol, with the symbol percent-encoded as a path segment.
    fn chart_url(&self, symbol: &str) -> Result<Url, DataError> {
        let mut url = Url::parse(&self.settings.chart_url)
            .map_err(|e| DataError::Other(format!("invalid chart URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| DataError::Other("chart URL cannot take a path".into()))?
            .pop_if_empty()
            .push(symbol);
        url.query_pairs_mut()
            .append_pair("range", "1d")
            .append_pair("interval", "1d");
        Ok(url)
    }

    fn parked(&self) -> MutexGuard<'_, HashMap<String, (Instant, ChartData)>> {
        self.parked.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Keep a chart for the history lookup that follows a missing quote.
    fn park(&self, symbol: &str, chart: ChartData) {
        let mut parked = self.parked();
        parked.retain(|_, (at, _)| at.elapsed() < PARKED_CHART_TTL);
        parked.insert(symbol.to_string(), (Instant::now(), chart));
    }

    fn take_parked(&self, symbol: &str) -> Option<ChartData> {
        match self.parked().remove(symbol) {
            Some((at, chart)) if at.elapsed() < PARKED_CHART_TTL => Some(chart),
            _ => None,
        }
    }

    /// Execute the chart request with retry and circuit breaker logic.
    fn fetch_chart(&self, symbol: &str) -> Result<ChartData, DataError> {
        if !self.circuit_breaker.is_allowed() {
            debug!(
                symbol,
                cooldown_secs = self.circuit_breaker.remaining_cooldown().as_secs(),
                "circuit breaker open, skipping request"
            );
            return Err(DataError::CircuitBreakerTripped);
        }

        let url = self.chart_url(symbol)?;
        let mut last_error = None;

        for attempt in 0..=self.settings.max_retries {
            if attempt > 0 {
                let delay = self.settings.base_delay * 2u32.pow(attempt - 1);
                std::thread::sleep(delay);
            }

            if !self.circuit_breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }

            debug!(symbol, attempt, "requesting yahoo chart");
            match self.client.get(url.clone()).send() {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::FORBIDDEN {
                        self.circuit_breaker.trip();
                        return Err(DataError::CircuitBreakerTripped);
                    }

                    if status == reqwest::StatusCode::NOT_FOUND {
                        // Yahoo still sends a chart body for unknown symbols; parse it below.
                        let body = resp.text().unwrap_or_default();
                        return parse_chart(symbol, &body);
                    }

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        self.circuit_breaker.record_failure();
                        let retry_after = resp
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(60);
                        last_error = Some(DataError::RateLimited {
                            retry_after_secs: retry_after,
                        });
                        continue;
                    }

                    if !status.is_success() {
                        self.circuit_breaker.record_failure();
                        last_error = Some(DataError::Other(format!("HTTP {status} for {symbol}")));
                        continue;
                    }

                    let body = resp.text().map_err(|e| {
                        DataError::NetworkUnreachable(format!("reading body for {symbol}: {e}"))
                    })?;
                    let chart = parse_chart(symbol, &body)?;
                    self.circuit_breaker.record_success();
                    return Ok(chart);
                }
                Err(e) => {
                    if e.is_connect() || e.is_timeout() {
                        last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                        continue;
                    }
                    return Err(DataError::NetworkUnreachable(e.to_string()));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

/// Parse a chart response body down to its single result.
fn parse_chart(symbol: &str, body: &str) -> Result<ChartData, DataError> {
    let resp: ChartResponse = serde_json::from_str(body).map_err(|e| {
        DataError::ResponseFormatChanged(format!("failed to parse response for {symbol}: {e}"))
    })?;

    let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
        Some(err) if err.code == "Not Found" => DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        },
        Some(err) => DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description)),
        None => DataError::ResponseFormatChanged("empty result with no error".into()),
    })?;

    result
        .into_iter()
        .next()
        .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))
}

fn current_from_chart(data: &ChartData) -> Option<f64> {
    data.meta.regular_market_price.filter(|p| p.is_finite())
}

/// Pair timestamps with closes, skipping null closes (halts, non-trading days).
fn closes_from_chart(data: &ChartData) -> Result<Vec<DailyClose>, DataError> {
    let Some(timestamps) = data.timestamp.as_ref() else {
        return Ok(Vec::new());
    };
    let closes = data
        .indicators
        .quote
        .first()
        .map(|q| q.close.as_slice())
        .unwrap_or_default();

    let mut out = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        let Some(close) = closes.get(i).copied().flatten() else {
            continue;
        };
        let date = chrono::DateTime::from_timestamp(ts, 0)
            .map(|dt| dt.naive_utc().date())
            .ok_or_else(|| DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}")))?;
        out.push(DailyClose { date, close });
    }
    Ok(out)
}

impl MarketDataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn current_price(&self, ticker: &str) -> Result<Option<f64>, DataError> {
        let chart = self.fetch_chart(ticker)?;
        let price = current_from_chart(&chart);
        if price.map_or(true, |p| p <= 0.0) {
            self.park(ticker, chart);
        }
        Ok(price)
    }

    fn daily_history(&self, ticker: &str) -> Result<Vec<DailyClose>, DataError> {
        let chart = match self.take_parked(ticker) {
            Some(chart) => chart,
            None => self.fetch_chart(ticker)?,
        };
        closes_from_chart(&chart)
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHART_OK: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"currency": "USD", "symbol": "XYZ", "regularMarketPrice": 12.34},
                "timestamp": [1760967000],
                "indicators": {"quote": [{"open": [12.0], "close": [12.31], "volume": [1000]}]}
            }],
            "error": null
        }
    }"#;

    const CHART_NO_PRICE: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"symbol": "XYZ"},
                "timestamp": [1760880600, 1760967000],
                "indicators": {"quote": [{"close": [11.5, null]}]}
            }],
            "error": null
        }
    }"#;

    const CHART_NOT_FOUND: &str = r#"{
        "chart": {
            "result": null,
            "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}
        }
    }"#;

    #[test]
    fn parses_current_price_and_closes() {
        let chart = parse_chart("XYZ", CHART_OK).unwrap();
        assert_eq!(current_from_chart(&chart), Some(12.34));
        let closes = closes_from_chart(&chart).unwrap();
        assert_eq!(closes.len(), 1);
        assert_eq!(closes[0].close, 12.31);
    }

    #[test]
    fn missing_price_and_null_closes() {
        let chart = parse_chart("XYZ", CHART_NO_PRICE).unwrap();
        assert_eq!(current_from_chart(&chart), None);
        let closes = closes_from_chart(&chart).unwrap();
        assert_eq!(closes.len(), 1);
        assert_eq!(closes[0].close, 11.5);
    }

    #[test]
    fn not_found_maps_to_symbol_not_found() {
        let err = parse_chart("NOPE", CHART_NOT_FOUND).unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound { symbol } if symbol == "NOPE"));
    }

    #[test]
    fn garbage_is_format_change() {
        let err = parse_chart("XYZ", "<html>captcha</html>").unwrap_err();
        assert!(matches!(err, DataError::ResponseFormatChanged(_)));
    }

    fn provider() -> YahooProvider {
        YahooProvider::new(
            Arc::new(CircuitBreaker::new(Duration::from_secs(60), 3)),
            YahooSettings::default(),
        )
        .unwrap()
    }

    #[test]
    fn chart_url_uses_one_day_range() {
        let url = provider().chart_url("XYZ").unwrap();
        assert_eq!(
            url.as_str(),
            "https://query2.finance.yahoo.com/v8/finance/chart/XYZ?range=1d&interval=1d"
        );
    }

    #[test]
    fn chart_url_encodes_reserved_characters() {
        let p = provider();
        assert!(p.chart_url("BRK/B").unwrap().path().ends_with("/chart/BRK%2FB"));
        let odd = p.chart_url("A?B#C").unwrap();
        assert!(odd.path().ends_with("/chart/A%3FB%23C"));
        assert_eq!(odd.query(), Some("range=1d&interval=1d"));
        assert_eq!(odd.fragment(), None);
    }

    #[test]
    fn parked_chart_is_taken_once() {
        let p = provider();
        p.park("XYZ", parse_chart("XYZ", CHART_NO_PRICE).unwrap());
        assert!(p.take_parked("XYZ").is_some());
        assert!(p.take_parked("XYZ").is_none());
        assert!(p.take_parked("ABC").is_none());
    }
}
