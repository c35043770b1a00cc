//! Catalyst Runner — refresh orchestration, configuration, dashboard model, reports.
//!
//! This crate builds on `catalyst-core` to provide:
//! - TOML scan configuration with defaults and validation
//! - The refresh pass (load, filter, top-N, bounded parallel pricing, flags)
//! - The dashboard model with ticker selection for the detail view
//! - Table, detail and JSON rendering

pub mod config;
pub mod dashboard;
pub mod refresh;
pub mod report;

pub use config::{ConfigError, PriceSettings, ScanConfig, MAX_PRICE_WORKERS};
pub use dashboard::Dashboard;
pub use refresh::{refresh, RefreshError, RefreshOptions};
pub use report::{format_price, format_runway, render_detail, render_empty, render_table, to_json};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn dashboard_is_send_sync() {
        assert_send::<Dashboard>();
        assert_sync::<Dashboard>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<ScanConfig>();
        assert_sync::<ScanConfig>();
        assert_send::<RefreshOptions>();
        assert_sync::<RefreshOptions>();
    }

    #[test]
    fn errors_are_send_sync() {
        assert_send::<RefreshError>();
        assert_sync::<RefreshError>();
        assert_send::<ConfigError>();
        assert_sync::<ConfigError>();
    }
}
