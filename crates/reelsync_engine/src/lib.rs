//! Reelsync engine: the async side of subscription orchestration.
//!
//! Owns the caches, the batch runner, the per-subscription monitor and the
//! new-item detector, and talks to the external collaborators through the
//! [`SubscriptionManager`], [`LibraryInventory`] and [`LinkDiscovery`]
//! traits. All state transitions are delegated to `reelsync_core`; this
//! crate only sequences I/O around them.
use std::sync::{Mutex, MutexGuard, PoisonError};

use reelsync_core::{LogEntry, LogStatus};
use reelsync_logging::{sync_error, sync_info, sync_warn};

mod bridge;
mod cache;
mod catalog;
mod collab;
mod detector;
mod emby;
mod error;
mod monitor;
mod orchestrator;
mod persist;
mod reconcile;
mod rest;
mod runner;
mod scheduler;
mod settings;

pub use bridge::{BridgeLinkDiscovery, BridgeSettings, DEFAULT_BRIDGE_TIMEOUT};
pub use cache::{Invalidate, TtlCache};
pub use catalog::Catalog;
pub use collab::{
    LibraryInventory, LibraryStats, LibraryTrends, LinkDiscovery, NewSubscription,
    SubscriptionManager, UnconfiguredDiscovery, UnconfiguredLibrary,
};
pub use detector::NewItemDetector;
pub use emby::{EmbyLibrary, EmbySettings};
pub use error::CollaboratorError;
pub use monitor::SubscriptionMonitor;
pub use orchestrator::{Checkpoint, Collaborators, MonitorCheckpoint, Orchestrator};
pub use persist::{CheckpointFile, PersistError};
pub use reconcile::{LinkReconciler, MergeError};
pub use rest::{RestSettings, RestSubscriptionManager};
pub use runner::TaskRunner;
pub use scheduler::BatchScheduler;
pub use settings::{CacheTtls, EngineSettings};

/// Locks `mutex`, recovering the data if a panicking holder poisoned it.
/// Every critical section in this crate leaves its state consistent.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mirrors an activity-log entry into the diagnostic log.
pub(crate) fn mirror_log(entry: &LogEntry) {
    match entry.status {
        LogStatus::Error => sync_error!("activity", "{}: {}", entry.title, entry.message),
        LogStatus::Warning => sync_warn!("activity", "{}: {}", entry.title, entry.message),
        LogStatus::Info | LogStatus::Success | LogStatus::Searching => {
            sync_info!("activity", "{}: {}", entry.title, entry.message)
        }
    }
}
