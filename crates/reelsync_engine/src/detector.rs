use std::sync::{Arc, Mutex};
use std::time::Duration;

use reelsync_core::{AutoSearchSettings, KnownIdSet, SubscriptionSnapshot};
use reelsync_logging::{sync_debug, sync_info};
use tokio::time::Instant;

use crate::catalog::Catalog;
use crate::lock;
use crate::monitor::SubscriptionMonitor;

/// Finds subscriptions created since the previous scan and hands them to the
/// monitor.
///
/// Relies on the subscription manager listing newest first. An item that is
/// re-ordered ahead of the boundary after being seen is not reported again,
/// and items behind such a bumped item can be missed.
pub struct NewItemDetector {
    catalog: Arc<Catalog>,
    monitor: Arc<SubscriptionMonitor>,
    auto_search: Arc<Mutex<AutoSearchSettings>>,
    known: Mutex<KnownIdSet>,
    scan_interval: Duration,
    last_scan: Mutex<Option<Instant>>,
}

impl NewItemDetector {
    pub fn new(
        catalog: Arc<Catalog>,
        monitor: Arc<SubscriptionMonitor>,
        auto_search: Arc<Mutex<AutoSearchSettings>>,
        scan_interval: Duration,
    ) -> Self {
        Self {
            catalog,
            monitor,
            auto_search,
            known: Mutex::new(KnownIdSet::new()),
            scan_interval,
            last_scan: Mutex::new(None),
        }
    }

    /// Compares the authoritative list against the known ids and registers a
    /// monitor for every new subscription. Empty while auto search is off.
    pub async fn scan(&self) -> Vec<SubscriptionSnapshot> {
        if !lock(&self.auto_search).enabled {
            return Vec::new();
        }
        *lock(&self.last_scan) = Some(Instant::now());

        let list = self.catalog.subscriptions(true).await;
        // A failed load reads as empty; it must not prime the known set.
        if list.is_empty() {
            return Vec::new();
        }
        let fresh = lock(&self.known).scan(&list);
        if fresh.is_empty() {
            sync_debug!("detector", "no new subscriptions among {}", list.len());
            return fresh;
        }

        sync_info!("detector", "{} new subscriptions detected", fresh.len());
        self.catalog.invalidate_incomplete();
        for item in &fresh {
            self.monitor.register(item);
        }
        fresh
    }

    /// Seconds until the next periodic scan, `None` while auto search is off.
    pub fn next_scan_seconds(&self) -> Option<u64> {
        if !lock(&self.auto_search).enabled {
            return None;
        }
        let last = (*lock(&self.last_scan))?;
        let next = last + self.scan_interval;
        Some(next.saturating_duration_since(Instant::now()).as_secs())
    }

    pub fn known_ids(&self) -> KnownIdSet {
        lock(&self.known).clone()
    }

    pub fn restore_known_ids(&self, known: KnownIdSet) {
        *lock(&self.known) = known;
    }

    pub fn reset(&self) {
        lock(&self.known).reset();
    }
}
