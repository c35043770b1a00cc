//! Live price lookups: result type, TTL cache, and the fetcher

pub mod cache;
pub mod fetcher;
pub mod lookup;

pub use cache::{PriceCache, DEFAULT_PRICE_TTL};
pub use fetcher::{resolve, PriceFetcher, DEFAULT_LOOKUP_TIMEOUT};
pub use lookup::{PriceLookup, UnavailableReason};
