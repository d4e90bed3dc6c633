use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use reelsync_core::{
    AutoSearchSettings, BatchTask, KnownIdSet, MonitorStatusView, SchedulerState, StartReceipt,
};
use reelsync_logging::{sync_info, sync_warn};
use tokio::runtime::Handle;

use crate::catalog::Catalog;
use crate::collab::{LibraryInventory, LinkDiscovery, SubscriptionManager};
use crate::detector::NewItemDetector;
use crate::lock;
use crate::monitor::SubscriptionMonitor;
use crate::reconcile::LinkReconciler;
use crate::runner::TaskRunner;
use crate::scheduler::BatchScheduler;
use crate::settings::EngineSettings;

/// The external systems the engine drives.
#[derive(Clone)]
pub struct Collaborators {
    pub manager: Arc<dyn SubscriptionManager>,
    pub library: Arc<dyn LibraryInventory>,
    pub discovery: Arc<dyn LinkDiscovery>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorCheckpoint {
    pub id: String,
    pub title: String,
    pub check_count: u32,
    pub remaining_seconds: u64,
}

/// Everything needed to resume background work after a restart. Cache
/// contents are deliberately absent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Checkpoint {
    pub monitors: Vec<MonitorCheckpoint>,
    pub known_ids: Vec<String>,
    pub known_ids_primed: bool,
    pub auto_search: AutoSearchSettings,
    pub scheduler: SchedulerState,
}

/// Owns one instance of every component and wires them together.
pub struct Orchestrator {
    catalog: Arc<Catalog>,
    reconciler: Arc<LinkReconciler>,
    monitor: Arc<SubscriptionMonitor>,
    detector: NewItemDetector,
    runner: TaskRunner,
    scheduler: BatchScheduler,
    auto_search: Arc<Mutex<AutoSearchSettings>>,
}

impl Orchestrator {
    pub fn new(collaborators: Collaborators, settings: &EngineSettings, runtime: Handle) -> Self {
        let Collaborators {
            manager,
            library,
            discovery,
        } = collaborators;

        let catalog = Arc::new(Catalog::new(manager, library, settings));
        let reconciler = Arc::new(LinkReconciler::new(catalog.clone()));
        let auto_search = Arc::new(Mutex::new(AutoSearchSettings::default()));
        let monitor = Arc::new(SubscriptionMonitor::new(
            catalog.clone(),
            discovery.clone(),
            reconciler.clone(),
            auto_search.clone(),
            settings,
            &runtime,
        ));
        let detector = NewItemDetector::new(
            catalog.clone(),
            monitor.clone(),
            auto_search.clone(),
            settings.scan_interval,
        );
        let runner = TaskRunner::new(discovery, reconciler.clone(), settings, runtime);

        Self {
            catalog,
            reconciler,
            monitor,
            detector,
            runner,
            scheduler: BatchScheduler::default(),
            auto_search,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn reconciler(&self) -> &LinkReconciler {
        &self.reconciler
    }

    pub fn monitor(&self) -> &SubscriptionMonitor {
        &self.monitor
    }

    pub fn detector(&self) -> &NewItemDetector {
        &self.detector
    }

    pub fn runner(&self) -> &TaskRunner {
        &self.runner
    }

    pub fn scheduler(&self) -> &BatchScheduler {
        &self.scheduler
    }

    pub fn auto_search(&self) -> AutoSearchSettings {
        *lock(&self.auto_search)
    }

    /// Replaces the auto-search settings. Known ids survive a toggle.
    pub fn set_auto_search(&self, settings: AutoSearchSettings) {
        *lock(&self.auto_search) = settings;
        sync_info!(
            "orchestrator",
            "auto search enabled={} delete_movie={} delete_tv={}",
            settings.enabled,
            settings.auto_delete_completed_movie,
            settings.auto_delete_completed_tv
        );
    }

    /// Starts a batch over every incomplete subscription.
    pub async fn start_incomplete_batch(&self) -> StartReceipt {
        let items = self.catalog.incomplete(true).await;
        if items.is_empty() {
            sync_info!("orchestrator", "no incomplete subscriptions to process");
            return StartReceipt::rejected();
        }
        self.runner.start(items)
    }

    pub fn stop_batch(&self) -> bool {
        self.runner.stop()
    }

    pub fn batch_status(&self) -> BatchTask {
        self.runner.status()
    }

    pub fn monitor_status(&self) -> MonitorStatusView {
        self.monitor.status(self.detector.next_scan_seconds())
    }

    pub async fn run_scheduled(&self, now: DateTime<Utc>) -> Option<StartReceipt> {
        self.scheduler
            .run_if_due(now, &self.catalog, &self.runner)
            .await
    }

    pub fn checkpoint(&self) -> Checkpoint {
        let now = tokio::time::Instant::now().into_std();
        let monitors = self
            .monitor
            .entries()
            .into_iter()
            .map(|entry| MonitorCheckpoint {
                remaining_seconds: entry.remaining_seconds(now),
                id: entry.id,
                title: entry.title,
                check_count: entry.check_count,
            })
            .collect();
        let known = self.detector.known_ids();

        Checkpoint {
            monitors,
            known_ids: known.to_sorted_vec(),
            known_ids_primed: known.is_primed(),
            auto_search: self.auto_search(),
            scheduler: self.scheduler.state(),
        }
    }

    pub fn restore(&self, checkpoint: Checkpoint) {
        *lock(&self.auto_search) = checkpoint.auto_search;
        self.scheduler.replace(checkpoint.scheduler);

        let known = if checkpoint.known_ids_primed {
            KnownIdSet::from_ids(checkpoint.known_ids)
        } else {
            KnownIdSet::new()
        };
        self.detector.restore_known_ids(known);

        let mut restored = 0usize;
        for entry in &checkpoint.monitors {
            let remaining = Duration::from_secs(entry.remaining_seconds);
            if self
                .monitor
                .restore(&entry.id, &entry.title, entry.check_count, remaining)
            {
                restored += 1;
            } else {
                sync_warn!("orchestrator", "duplicate monitor entry {} in checkpoint", entry.id);
            }
        }
        sync_info!("orchestrator", "restored {} monitor entries", restored);
    }

    /// Stops the running batch and the monitor worker. Monitor entries stay
    /// in place so a final checkpoint still captures them.
    pub fn shutdown(&self) {
        if self.runner.stop() {
            sync_info!("orchestrator", "running batch stopped for shutdown");
        }
        self.monitor.shutdown();
    }
}
