use std::time::Duration;

use reelsync_core::{DEFAULT_CHECK_INTERVAL, DEFAULT_LOG_CAPACITY, DEFAULT_MAX_CHECKS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    pub subscriptions: Duration,
    pub incomplete: Duration,
    pub incomplete_pages: Duration,
    pub library_stats: Duration,
    pub trends: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            subscriptions: Duration::from_secs(5 * 60),
            incomplete: Duration::from_secs(5 * 60),
            incomplete_pages: Duration::from_secs(5 * 60),
            library_stats: Duration::from_secs(10 * 60),
            trends: Duration::from_secs(30 * 60),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub monitor_interval: Duration,
    pub monitor_max_checks: u32,
    /// Pause between batch items, rate-limiting the discovery collaborator.
    pub batch_item_delay: Duration,
    pub log_capacity: usize,
    pub scan_interval: Duration,
    pub trend_days: u32,
    pub ttls: CacheTtls,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            monitor_interval: DEFAULT_CHECK_INTERVAL,
            monitor_max_checks: DEFAULT_MAX_CHECKS,
            batch_item_delay: Duration::from_secs(1),
            log_capacity: DEFAULT_LOG_CAPACITY,
            scan_interval: Duration::from_secs(60),
            trend_days: 7,
            ttls: CacheTtls::default(),
        }
    }
}
