//! Price fetcher — cached, deadline-bounded live price lookups.
//!
//! Resolution order for one ticker:
//! 1. Provider's current price, if present and positive.
//! 2. Otherwise the most recent positive close from the one-day history window.
//! 3. Otherwise unavailable.
//!
//! Provider errors never escape: they are logged and folded into
//! `PriceLookup::Unavailable`. Each uncached lookup runs on a helper thread and is
//! abandoned after `lookup_timeout`, so one hung request cannot stall a refresh.

use super::cache::PriceCache;
use super::lookup::{PriceLookup, UnavailableReason};
use crate::data::provider::{DataError, MarketDataProvider};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Default per-lookup deadline.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Cached live price lookups against one provider.
pub struct PriceFetcher {
    provider: Arc<dyn MarketDataProvider>,
    cache: Arc<PriceCache>,
    lookup_timeout: Duration,
}

impl PriceFetcher {
    pub fn new(provider: Arc<dyn MarketDataProvider>, cache: Arc<PriceCache>) -> Self {
        Self {
            provider,
            cache,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn cache(&self) -> &PriceCache {
        &self.cache
    }

    /// Live price for `ticker`, `None` when unavailable.
    pub fn get_price(&self, ticker: &str) -> Option<f64> {
        self.lookup(ticker).price()
    }

    /// Live price for `ticker` with the reason when there is none.
    pub fn lookup(&self, ticker: &str) -> PriceLookup {
        let ticker = ticker.trim();
        if ticker.is_empty() {
            return PriceLookup::Unavailable(UnavailableReason::EmptyTicker);
        }
        self.cache
            .get_or_fetch(ticker, || self.lookup_with_deadline(ticker))
    }

    fn lookup_with_deadline(&self, ticker: &str) -> PriceLookup {
        if !self.provider.is_available() {
            debug!(ticker, "provider unavailable, skipping lookup");
            return PriceLookup::Unavailable(UnavailableReason::ProviderBlocked);
        }

        let (tx, rx) = mpsc::channel();
        let provider = Arc::clone(&self.provider);
        let symbol = ticker.to_string();
        let spawned = thread::Builder::new()
            .name(format!("price-{ticker}"))
            .spawn(move || {
                // The receiver is gone if we already timed out.
                let _ = tx.send(resolve(provider.as_ref(), &symbol));
            });
        if let Err(e) = spawned {
            warn!(ticker, error = %e, "could not start price lookup");
            return PriceLookup::Unavailable(UnavailableReason::ProviderError);
        }

        match rx.recv_timeout(self.lookup_timeout) {
            Ok(lookup) => lookup,
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    ticker,
                    timeout_ms = self.lookup_timeout.as_millis() as u64,
                    "price lookup timed out"
                );
                PriceLookup::Unavailable(UnavailableReason::TimedOut)
            }
            Err(RecvTimeoutError::Disconnected) => {
                warn!(ticker, "price lookup aborted");
                PriceLookup::Unavailable(UnavailableReason::ProviderError)
            }
        }
    }
}

/// Run the current-price → daily-history fallback against a provider, uncached.
pub fn resolve(provider: &dyn MarketDataProvider, ticker: &str) -> PriceLookup {
    let mut current_failed = false;
    match provider.current_price(ticker) {
        Ok(Some(raw)) => {
            if let Some(lookup) = PriceLookup::from_raw(raw) {
                return lookup;
            }
            debug!(ticker, raw, "current price not positive, falling back to history");
        }
        Ok(None) => debug!(ticker, "no current price, falling back to history"),
        Err(DataError::CircuitBreakerTripped) => {
            return PriceLookup::Unavailable(UnavailableReason::ProviderBlocked);
        }
        Err(e) => {
            debug!(ticker, error = %e, "current price failed, falling back to history");
            current_failed = true;
        }
    }

    match provider.daily_history(ticker) {
        Ok(closes) => closes
            .iter()
            .rev()
            .find_map(|c| PriceLookup::from_raw(c.close))
            .unwrap_or_else(|| {
                let reason = if current_failed {
                    UnavailableReason::ProviderError
                } else {
                    UnavailableReason::NoQuote
                };
                debug!(ticker, %reason, "no usable close in history");
                PriceLookup::Unavailable(reason)
            }),
        Err(DataError::CircuitBreakerTripped) => {
            PriceLookup::Unavailable(UnavailableReason::ProviderBlocked)
        }
        Err(e) => {
            warn!(ticker, provider = provider.name(), error = %e, "price unavailable");
            PriceLookup::Unavailable(UnavailableReason::ProviderError)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::provider::DailyClose;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scriptable provider: each field decides one call's answer.
    struct Scripted {
        current: fn() -> Result<Option<f64>, DataError>,
        history: fn() -> Result<Vec<DailyClose>, DataError>,
        delay: Duration,
        current_calls: AtomicUsize,
        history_calls: AtomicUsize,
    }

    impl Scripted {
        fn new(
            current: fn() -> Result<Option<f64>, DataError>,
            history: fn() -> Result<Vec<DailyClose>, DataError>,
        ) -> Self {
            Self {
                current,
                history,
                delay: Duration::ZERO,
                current_calls: AtomicUsize::new(0),
                history_calls: AtomicUsize::new(0),
            }
        }
    }

    impl MarketDataProvider for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        fn current_price(&self, _ticker: &str) -> Result<Option<f64>, DataError> {
            self.current_calls.fetch_add(1, Ordering::SeqCst);
            thread::sleep(self.delay);
            (self.current)()
        }

        fn daily_history(&self, _ticker: &str) -> Result<Vec<DailyClose>, DataError> {
            self.history_calls.fetch_add(1, Ordering::SeqCst);
            (self.history)()
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    fn one_close(close: f64) -> Vec<DailyClose> {
        vec![DailyClose {
            date: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
            close,
        }]
    }

    fn fetcher(provider: Arc<Scripted>) -> PriceFetcher {
        PriceFetcher::new(provider, Arc::new(PriceCache::default()))
    }

    #[test]
    fn current_price_wins() {
        let provider = Arc::new(Scripted::new(|| Ok(Some(12.5)), || Ok(one_close(9.0))));
        assert_eq!(fetcher(provider.clone()).get_price("XYZ"), Some(12.5));
        assert_eq!(provider.history_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn zero_current_price_falls_back_to_history() {
        let provider = Arc::new(Scripted::new(|| Ok(Some(0.0)), || Ok(one_close(9.0))));
        assert_eq!(fetcher(provider.clone()).get_price("XYZ"), Some(9.0));
        assert_eq!(provider.history_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn missing_current_price_falls_back_to_history() {
        let provider = Arc::new(Scripted::new(|| Ok(None), || Ok(one_close(4.25))));
        assert_eq!(fetcher(provider).get_price("XYZ"), Some(4.25));
    }

    #[test]
    fn most_recent_usable_close_is_used() {
        let provider = Arc::new(Scripted::new(
            || Ok(None),
            || {
                let d = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
                Ok(vec![
                    DailyClose { date: d, close: 5.0 },
                    DailyClose { date: d.succ_opt().unwrap(), close: 6.0 },
                    DailyClose { date: d.succ_opt().unwrap().succ_opt().unwrap(), close: f64::NAN },
                ])
            },
        ));
        assert_eq!(fetcher(provider).get_price("XYZ"), Some(6.0));
    }

    #[test]
    fn errors_on_both_calls_yield_none() {
        let provider = Arc::new(Scripted::new(
            || Err(DataError::NetworkUnreachable("down".into())),
            || Err(DataError::Other("still down".into())),
        ));
        let fetcher = fetcher(provider);
        assert_eq!(fetcher.get_price("XYZ"), None);
        assert_eq!(
            fetcher.lookup("XYZ"),
            PriceLookup::Unavailable(UnavailableReason::ProviderError)
        );
    }

    #[test]
    fn current_error_still_tries_history() {
        let provider = Arc::new(Scripted::new(
            || Err(DataError::RateLimited { retry_after_secs: 1 }),
            || Ok(one_close(3.3)),
        ));
        assert_eq!(fetcher(provider).get_price("XYZ"), Some(3.3));
    }

    #[test]
    fn empty_history_is_no_quote() {
        let provider = Arc::new(Scripted::new(|| Ok(None), || Ok(Vec::new())));
        assert_eq!(
            fetcher(provider).lookup("XYZ"),
            PriceLookup::Unavailable(UnavailableReason::NoQuote)
        );
    }

    #[test]
    fn blocked_provider_is_reported() {
        let provider = Arc::new(Scripted::new(
            || Err(DataError::CircuitBreakerTripped),
            || Ok(one_close(1.0)),
        ));
        assert_eq!(
            fetcher(provider.clone()).lookup("XYZ"),
            PriceLookup::Unavailable(UnavailableReason::ProviderBlocked)
        );
        assert_eq!(provider.history_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn empty_ticker_skips_provider() {
        let provider = Arc::new(Scripted::new(|| Ok(Some(1.0)), || Ok(Vec::new())));
        let fetcher = fetcher(provider.clone());
        assert_eq!(
            fetcher.lookup("  "),
            PriceLookup::Unavailable(UnavailableReason::EmptyTicker)
        );
        assert_eq!(provider.current_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn second_lookup_is_served_from_cache() {
        let provider = Arc::new(Scripted::new(|| Ok(Some(8.0)), || Ok(Vec::new())));
        let fetcher = fetcher(provider.clone());
        assert_eq!(fetcher.get_price("XYZ"), Some(8.0));
        assert_eq!(fetcher.get_price("XYZ"), Some(8.0));
        assert_eq!(provider.current_calls.load(Ordering::SeqCst), 1);
        assert_eq!(fetcher.cache().len(), 1);
    }

    #[test]
    fn slow_provider_times_out_as_unavailable() {
        let mut scripted = Scripted::new(|| Ok(Some(8.0)), || Ok(Vec::new()));
        scripted.delay = Duration::from_millis(300);
        let fetcher = fetcher(Arc::new(scripted)).with_lookup_timeout(Duration::from_millis(20));
        assert_eq!(
            fetcher.lookup("XYZ"),
            PriceLookup::Unavailable(UnavailableReason::TimedOut)
        );
    }
}
