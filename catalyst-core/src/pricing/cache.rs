//! Per-ticker price cache with a fixed time-to-live.
//!
//! Entries hold the lookup outcome (available or not) and when it was fetched.
//! A ticker being fetched is marked in-flight; other callers for the same ticker
//! block on a condition variable until the first fetch lands, then share its result.

use super::lookup::PriceLookup;
use crate::domain::Ticker;
use std::collections::HashMap;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Default time-to-live for cached prices.
pub const DEFAULT_PRICE_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone)]
enum Slot {
    InFlight,
    Ready {
        lookup: PriceLookup,
        fetched_at: Instant,
    },
}

/// Shared cache of price lookups keyed by ticker.
#[derive(Debug)]
pub struct PriceCache {
    slots: Mutex<HashMap<Ticker, Slot>>,
    landed: Condvar,
    ttl: Duration,
}

impl Default for PriceCache {
    fn default() -> Self {
        Self::new(DEFAULT_PRICE_TTL)
    }
}

impl PriceCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            landed: Condvar::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Ticker, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fresh(&self, slot: Option<&Slot>) -> Option<PriceLookup> {
        match slot {
            Some(Slot::Ready { lookup, fetched_at }) if fetched_at.elapsed() < self.ttl => {
                Some(*lookup)
            }
            _ => None,
        }
    }

    /// Cached lookup for `ticker` if it has not expired.
    pub fn get(&self, ticker: &str) -> Option<PriceLookup> {
        self.fresh(self.lock().get(ticker))
    }

    /// Store a lookup, replacing whatever was there.
    pub fn insert(&self, ticker: &str, lookup: PriceLookup) {
        self.lock().insert(
            ticker.to_string(),
            Slot::Ready {
                lookup,
                fetched_at: Instant::now(),
            },
        );
        self.landed.notify_all();
    }

    /// Return the cached lookup, or run `fetch` once and cache its result.
    ///
    /// Concurrent callers for a ticker that is already in flight wait for that
    /// fetch instead of starting their own.
    pub fn get_or_fetch<F>(&self, ticker: &str, fetch: F) -> PriceLookup
    where
        F: FnOnce() -> PriceLookup,
    {
        let mut slots = self.lock();
        loop {
            if let Some(lookup) = self.fresh(slots.get(ticker)) {
                return lookup;
            }
            if !matches!(slots.get(ticker), Some(Slot::InFlight)) {
                break;
            }
            slots = self
                .landed
                .wait(slots)
                .unwrap_or_else(PoisonError::into_inner);
        }
        slots.insert(ticker.to_string(), Slot::InFlight);
        drop(slots);

        let mut pending = PendingFetch {
            cache: self,
            ticker,
            done: false,
        };
        let lookup = fetch();
        self.insert(ticker, lookup);
        pending.done = true;
        lookup
    }

    /// Number of completed entries, expired ones included.
    pub fn len(&self) -> usize {
        self.lock()
            .values()
            .filter(|slot| matches!(slot, Slot::Ready { .. }))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop entries whose TTL has passed. In-flight markers are kept.
    pub fn purge_expired(&self) {
        let ttl = self.ttl;
        self.lock().retain(|_, slot| match slot {
            Slot::InFlight => true,
            Slot::Ready { fetched_at, .. } => fetched_at.elapsed() < ttl,
        });
    }
}

/// Clears the in-flight marker if the fetch closure panics, so waiters retry.
struct PendingFetch<'a> {
    cache: &'a PriceCache,
    ticker: &'a str,
    done: bool,
}

impl Drop for PendingFetch<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.cache.lock().remove(self.ticker);
            self.cache.landed.notify_all();
        }
    }
}
