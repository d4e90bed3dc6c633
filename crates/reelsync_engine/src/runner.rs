use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::FutureExt;
use reelsync_core::{BatchTask, ItemOutcome, StartReceipt, SubscriptionSnapshot, TaskId};
use reelsync_logging::{sync_debug, sync_info};
use tokio::runtime::Handle;

use crate::collab::LinkDiscovery;
use crate::reconcile::{LinkReconciler, MergeError};
use crate::settings::EngineSettings;
use crate::{lock, mirror_log};

/// Single-flight batch executor.
///
/// `start` arms the shared [`BatchTask`] and spawns the loop; it never waits
/// for the run. The loop re-checks its generation token after every await and
/// exits without touching the record once a `stop` or a newer `start` has
/// superseded it.
#[derive(Clone)]
pub struct TaskRunner {
    shared: Arc<RunnerShared>,
    runtime: Handle,
}

struct RunnerShared {
    task: Mutex<BatchTask>,
    discovery: Arc<dyn LinkDiscovery>,
    reconciler: Arc<LinkReconciler>,
    item_delay: Duration,
}

impl TaskRunner {
    pub fn new(
        discovery: Arc<dyn LinkDiscovery>,
        reconciler: Arc<LinkReconciler>,
        settings: &EngineSettings,
        runtime: Handle,
    ) -> Self {
        Self {
            shared: Arc::new(RunnerShared {
                task: Mutex::new(BatchTask::with_log_capacity(settings.log_capacity)),
                discovery,
                reconciler,
                item_delay: settings.batch_item_delay,
            }),
            runtime,
        }
    }

    pub fn start(&self, items: Vec<SubscriptionSnapshot>) -> StartReceipt {
        let receipt = self.shared.with_task(|task| {
            let receipt = task.try_start(items.len());
            (receipt, receipt.accepted)
        });

        match receipt.task_id {
            Some(task_id) => {
                sync_info!("runner", "batch {} accepted with {} items", task_id, items.len());
                let shared = self.shared.clone();
                self.runtime.spawn(async move {
                    shared.run(task_id, items).await;
                });
            }
            None => sync_debug!("runner", "start rejected, a batch is already running"),
        }
        receipt
    }

    /// Cooperative cancel, observed at the loop's next checkpoint.
    pub fn stop(&self) -> bool {
        self.shared.with_task(|task| {
            let stopped = task.stop();
            (stopped, stopped)
        })
    }

    /// Read-only copy of the batch record.
    pub fn status(&self) -> BatchTask {
        lock(&self.shared.task).clone()
    }

    pub fn is_running(&self) -> bool {
        lock(&self.shared.task).running
    }
}

impl RunnerShared {
    /// Runs `f` under the lock; mirrors the newest ring entry when `f` says
    /// it appended one.
    fn with_task<R>(&self, f: impl FnOnce(&mut BatchTask) -> (R, bool)) -> R {
        let mut task = lock(&self.task);
        let (result, logged) = f(&mut task);
        if logged {
            if let Some(entry) = task.logs.latest() {
                mirror_log(entry);
            }
        }
        result
    }

    fn is_current(&self, task_id: TaskId) -> bool {
        lock(&self.task).is_current(task_id)
    }

    async fn run(&self, task_id: TaskId, items: Vec<SubscriptionSnapshot>) {
        let last = items.len().saturating_sub(1);
        for (index, item) in items.iter().enumerate() {
            let begun = self.with_task(|task| {
                let begun = task.begin_item(task_id, index, &item.title);
                (begun, begun)
            });
            if !begun {
                return self.superseded(task_id);
            }

            let found = AssertUnwindSafe(
                self.discovery
                    .discover_links(&item.external_id, item.media_type),
            )
            .catch_unwind()
            .await;
            if !self.is_current(task_id) {
                return self.superseded(task_id);
            }

            let outcome = match found {
                Ok(Ok(links)) if links.is_empty() => ItemOutcome::NoLinks,
                Ok(Ok(links)) => {
                    match AssertUnwindSafe(self.reconciler.merge(item, &links))
                        .catch_unwind()
                        .await
                    {
                        Ok(Ok(merge)) => ItemOutcome::Merged(merge),
                        Ok(Err(MergeError::TriggerFailed { outcome, reason })) => {
                            ItemOutcome::TriggerFailed {
                                merge: outcome,
                                reason: reason.to_string(),
                            }
                        }
                        Ok(Err(MergeError::Collaborator(err))) => {
                            ItemOutcome::MergeFailed(err.to_string())
                        }
                        Err(panic) => ItemOutcome::MergeFailed(panic_message(panic.as_ref())),
                    }
                }
                Ok(Err(err)) => ItemOutcome::DiscoveryFailed(err.to_string()),
                Err(panic) => ItemOutcome::DiscoveryFailed(panic_message(panic.as_ref())),
            };

            let recorded = self.with_task(|task| {
                let recorded = task.record(task_id, &item.title, &outcome);
                (recorded, recorded)
            });
            if !recorded {
                return self.superseded(task_id);
            }

            if index < last {
                tokio::time::sleep(self.item_delay).await;
                if !self.is_current(task_id) {
                    return self.superseded(task_id);
                }
            }
        }

        self.with_task(|task| {
            let finished = task.finish(task_id);
            (finished, finished)
        });
    }

    fn superseded(&self, task_id: TaskId) {
        sync_debug!("runner", "batch {} superseded, exiting", task_id);
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        return format!("panicked: {message}");
    }
    if let Some(message) = panic.downcast_ref::<String>() {
        return format!("panicked: {message}");
    }
    "panicked".to_string()
}
