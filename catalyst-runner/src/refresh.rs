//! One refresh pass: load → filter → top-N → prices → flags.
//!
//! Price lookups for the top-N window fan out over a small rayon pool. Collecting
//! the pool's results is the barrier: rules only run once every lookup has either
//! produced a price or resolved to unavailable. Without a fetcher (offline mode)
//! every price is unavailable and no network call is made.

use crate::config::{ScanConfig, MAX_PRICE_WORKERS};
use crate::dashboard::Dashboard;
use catalyst_core::{flag, upcoming, CatalystRecord, CatalystStore, PriceFetcher, PricedCatalyst, StoreError, Upcoming};
use chrono::NaiveDate;
use rayon::prelude::*;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to start price workers: {0}")]
    WorkerPool(String),
}

/// Options for a single refresh pass.
#[derive(Debug, Clone)]
pub struct RefreshOptions {
    /// Catalysts dated before this day are dropped.
    pub as_of: NaiveDate,
    /// Size of the priced window.
    pub top_n: usize,
    /// Concurrent price lookups, capped at [`MAX_PRICE_WORKERS`].
    pub max_workers: usize,
}

impl RefreshOptions {
    pub fn from_config(config: &ScanConfig, as_of: NaiveDate) -> Self {
        Self {
            as_of,
            top_n: config.scan.top_n,
            max_workers: config.prices.max_workers,
        }
    }
}

/// Run one refresh pass. Dataset errors are fatal; price failures are not.
pub fn refresh(
    store: &CatalystStore,
    fetcher: Option<&PriceFetcher>,
    opts: &RefreshOptions,
) -> Result<Dashboard, RefreshError> {
    let records = store.load()?;
    let total_records = records.len();
    if let Some(fetcher) = fetcher {
        fetcher.cache().purge_expired();
    }

    let events = match upcoming(records, opts.as_of) {
        Upcoming::Empty => {
            info!(as_of = %opts.as_of, total_records, "no upcoming catalysts");
            return Ok(Dashboard::Empty {
                as_of: opts.as_of,
                total_records,
            });
        }
        events @ Upcoming::Events(_) => events,
    };

    let total_upcoming = events.len();
    let window = events.top(opts.top_n);

    let priced = match fetcher {
        Some(fetcher) => {
            info!(count = window.len(), provider = fetcher.provider_name(), "fetching live prices");
            price_window(window, fetcher, opts.max_workers)?
        }
        None => window.into_iter().map(|r| r.with_price(None)).collect(),
    };

    let rows: Vec<_> = priced.into_iter().map(flag).collect();
    info!(
        rows = rows.len(),
        priced = rows.iter().filter(|r| r.live_price().is_some()).count(),
        flagged = rows.iter().filter(|r| !r.is_clean()).count(),
        "refresh complete"
    );

    Ok(Dashboard::Ready {
        as_of: opts.as_of,
        total_upcoming,
        rows,
    })
}

/// Look up prices for the window, preserving its order.
fn price_window(
    window: Vec<CatalystRecord>,
    fetcher: &PriceFetcher,
    max_workers: usize,
) -> Result<Vec<PricedCatalyst>, RefreshError> {
    let workers = max_workers.clamp(1, MAX_PRICE_WORKERS).min(window.len());
    let price_one = |record: CatalystRecord| {
        let price = fetcher.get_price(&record.ticker);
        record.with_price(price)
    };

    if workers <= 1 {
        return Ok(window.into_iter().map(price_one).collect());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("price-worker-{i}"))
        .build()
        .map_err(|e| RefreshError::WorkerPool(e.to_string()))?;

    Ok(pool.install(|| window.into_par_iter().map(price_one).collect()))
}
