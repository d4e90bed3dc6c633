use std::sync::Mutex;

use chrono::{DateTime, Utc};
use reelsync_core::{SchedulerState, StartReceipt};
use reelsync_logging::sync_info;

use crate::catalog::Catalog;
use crate::lock;
use crate::runner::TaskRunner;

/// Periodic reconciliation of every incomplete subscription.
#[derive(Debug, Default)]
pub struct BatchScheduler {
    state: Mutex<SchedulerState>,
}

impl BatchScheduler {
    pub fn new(state: SchedulerState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn state(&self) -> SchedulerState {
        lock(&self.state).clone()
    }

    pub fn replace(&self, state: SchedulerState) {
        *lock(&self.state) = state;
    }

    pub fn toggle(&self, enabled: bool, now: DateTime<Utc>) {
        lock(&self.state).toggle(enabled, now);
        sync_info!("scheduler", "periodic reconciliation enabled={}", enabled);
    }

    pub fn set_interval_hours(&self, hours: u32, now: DateTime<Utc>) {
        lock(&self.state).set_interval_hours(hours, now);
    }

    /// Starts a batch over the incomplete list when the schedule is due. The
    /// next run is pushed back one interval whether or not the batch was
    /// accepted. `None` when nothing was due.
    pub async fn run_if_due(
        &self,
        now: DateTime<Utc>,
        catalog: &Catalog,
        runner: &TaskRunner,
    ) -> Option<StartReceipt> {
        {
            let mut state = lock(&self.state);
            if !state.due(now) {
                return None;
            }
            state.advance(now);
        }

        let items = catalog.incomplete(true).await;
        if items.is_empty() {
            sync_info!("scheduler", "scheduled run found no incomplete subscriptions");
            return Some(StartReceipt::rejected());
        }
        let receipt = runner.start(items);
        sync_info!("scheduler", "scheduled run accepted={}", receipt.accepted);
        Some(receipt)
    }
}
