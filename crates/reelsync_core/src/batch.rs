use crate::{LogEntry, LogRing, LogStatus, MergeOutcome};

/// Generation token identifying one batch run. Strictly increasing per
/// [`BatchTask`]; a run may only mutate the record while its token is current.
pub type TaskId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchResults {
    pub success: usize,
    pub fail: usize,
    pub total_links_added: usize,
    /// Successful items whose links were all known already.
    pub skipped: usize,
}

/// Answer to a start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartReceipt {
    pub accepted: bool,
    pub task_id: Option<TaskId>,
}

impl StartReceipt {
    pub fn rejected() -> Self {
        Self {
            accepted: false,
            task_id: None,
        }
    }
}

/// How one batch item ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Merged(MergeOutcome),
    /// Links were saved but the follow-up execution could not be started.
    TriggerFailed {
        merge: MergeOutcome,
        reason: String,
    },
    NoLinks,
    MergeFailed(String),
    DiscoveryFailed(String),
}

/// The single batch record shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchTask {
    pub running: bool,
    pub task_id: Option<TaskId>,
    pub progress: usize,
    pub total: usize,
    pub current_item: Option<String>,
    pub logs: LogRing,
    pub results: BatchResults,
    last_task_id: TaskId,
}

impl Default for BatchTask {
    fn default() -> Self {
        Self::with_log_capacity(crate::DEFAULT_LOG_CAPACITY)
    }
}

impl BatchTask {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log_capacity(capacity: usize) -> Self {
        Self {
            running: false,
            task_id: None,
            progress: 0,
            total: 0,
            current_item: None,
            logs: LogRing::with_capacity(capacity),
            results: BatchResults::default(),
            last_task_id: 0,
        }
    }

    /// Arms a new run over `total` items. Rejected without any change while a
    /// run is active.
    pub fn try_start(&mut self, total: usize) -> StartReceipt {
        if self.running {
            return StartReceipt::rejected();
        }
        self.last_task_id += 1;
        let task_id = self.last_task_id;
        self.running = true;
        self.task_id = Some(task_id);
        self.progress = 0;
        self.total = total;
        self.current_item = None;
        self.logs.clear();
        self.results = BatchResults::default();
        self.logs.push(LogEntry::now(
            "batch",
            LogStatus::Info,
            format!("started reconciliation of {total} subscriptions"),
        ));
        StartReceipt {
            accepted: true,
            task_id: Some(task_id),
        }
    }

    /// True while `task_id` is the live run. Checked after every suspension.
    pub fn is_current(&self, task_id: TaskId) -> bool {
        self.running && self.task_id == Some(task_id)
    }

    /// Marks item `index` as in progress. Returns false if superseded.
    pub fn begin_item(&mut self, task_id: TaskId, index: usize, label: &str) -> bool {
        if !self.is_current(task_id) {
            return false;
        }
        self.progress = index + 1;
        self.current_item = Some(label.to_string());
        self.logs.push(LogEntry::now(
            label,
            LogStatus::Searching,
            format!("searching links ({}/{})", self.progress, self.total),
        ));
        true
    }

    /// Folds one item's outcome into the results. Returns false if superseded.
    pub fn record(&mut self, task_id: TaskId, label: &str, outcome: &ItemOutcome) -> bool {
        if !self.is_current(task_id) {
            return false;
        }
        let entry = match outcome {
            ItemOutcome::Merged(merge) => {
                self.results.success += 1;
                self.results.total_links_added += merge.added;
                if merge.added == 0 {
                    self.results.skipped += 1;
                    LogEntry::now(
                        label,
                        LogStatus::Info,
                        format!("all {} links already present", merge.total),
                    )
                } else {
                    LogEntry::now(
                        label,
                        LogStatus::Success,
                        format!(
                            "added {} links ({} duplicate)",
                            merge.added, merge.duplicate
                        ),
                    )
                }
            }
            ItemOutcome::TriggerFailed { merge, reason } => {
                self.results.success += 1;
                self.results.total_links_added += merge.added;
                LogEntry::now(
                    label,
                    LogStatus::Warning,
                    format!(
                        "added {} links, but starting execution failed: {reason}",
                        merge.added
                    ),
                )
            }
            ItemOutcome::NoLinks => {
                self.results.fail += 1;
                LogEntry::now(label, LogStatus::Warning, "no links found")
            }
            ItemOutcome::MergeFailed(reason) => {
                self.results.fail += 1;
                LogEntry::now(label, LogStatus::Error, format!("saving links failed: {reason}"))
            }
            ItemOutcome::DiscoveryFailed(reason) => {
                self.results.fail += 1;
                LogEntry::now(label, LogStatus::Error, format!("search failed: {reason}"))
            }
        };
        self.logs.push(entry);
        true
    }

    /// Cancels the live run, if any. Idempotent.
    pub fn stop(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.running = false;
        self.task_id = None;
        self.current_item = None;
        self.logs.push(LogEntry::now(
            "batch",
            LogStatus::Warning,
            format!("stopped at {}/{}", self.progress, self.total),
        ));
        true
    }

    /// Closes a run that walked every item. A superseded run gets false and
    /// must exit without touching the record.
    pub fn finish(&mut self, task_id: TaskId) -> bool {
        if !self.is_current(task_id) {
            return false;
        }
        self.running = false;
        self.current_item = None;
        self.logs.push(LogEntry::now(
            "batch",
            LogStatus::Success,
            format!(
                "finished: {} succeeded, {} failed, {} links added, {} already complete",
                self.results.success,
                self.results.fail,
                self.results.total_links_added,
                self.results.skipped
            ),
        ));
        true
    }
}
