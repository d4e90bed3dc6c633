use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use futures_util::{FutureExt, StreamExt};
use reelsync_core::{
    AutoSearchSettings, ExecutionStatus, LogEntry, LogRing, LogStatus, MonitorBoard,
    MonitorEntry, MonitorMsg, MonitorStatusView, MonitorStep, SubscriptionSnapshot, TerminalKind,
};
use reelsync_logging::{sync_debug, sync_error, sync_warn};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::time::{delay_queue, DelayQueue};

use crate::catalog::Catalog;
use crate::collab::LinkDiscovery;
use crate::reconcile::{LinkReconciler, MergeError};
use crate::settings::EngineSettings;
use crate::{lock, mirror_log};

enum MonitorCommand {
    Arm {
        id: String,
        generation: u64,
        at: Instant,
    },
    Disarm(String),
    Shutdown,
}

/// Watches newly created subscriptions until their first execution resolves.
///
/// Entries live on a [`MonitorBoard`]; their timers live in a delay queue
/// owned by a single worker task, one timer per id. Each expiry spawns one
/// tick. A tick holds no lock across its collaborator calls and re-checks that
/// the registration it was armed for is still on the board before applying
/// what it observed.
pub struct SubscriptionMonitor {
    shared: Arc<MonitorShared>,
    commands: mpsc::UnboundedSender<MonitorCommand>,
}

struct MonitorShared {
    board: Mutex<MonitorBoard>,
    logs: Mutex<LogRing>,
    auto_search: Arc<Mutex<AutoSearchSettings>>,
    catalog: Arc<Catalog>,
    discovery: Arc<dyn LinkDiscovery>,
    reconciler: Arc<LinkReconciler>,
}

fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

impl SubscriptionMonitor {
    pub fn new(
        catalog: Arc<Catalog>,
        discovery: Arc<dyn LinkDiscovery>,
        reconciler: Arc<LinkReconciler>,
        auto_search: Arc<Mutex<AutoSearchSettings>>,
        settings: &EngineSettings,
        runtime: &Handle,
    ) -> Self {
        let shared = Arc::new(MonitorShared {
            board: Mutex::new(MonitorBoard::new(
                settings.monitor_interval,
                settings.monitor_max_checks,
            )),
            logs: Mutex::new(LogRing::with_capacity(settings.log_capacity)),
            auto_search,
            catalog,
            discovery,
            reconciler,
        });
        let (commands, inbox) = mpsc::unbounded_channel();
        runtime.spawn(drive(shared.clone(), inbox));
        Self { shared, commands }
    }

    /// Starts watching `subscription`. False if it is already watched.
    pub fn register(&self, subscription: &SubscriptionSnapshot) -> bool {
        let armed = lock(&self.shared.board).register(&subscription.id, &subscription.title, now());
        match armed {
            Some((at, generation)) => {
                self.arm(&subscription.id, generation, at);
                self.shared.log(
                    &subscription.title,
                    LogStatus::Info,
                    "new subscription detected, monitoring started".to_string(),
                );
                true
            }
            None => false,
        }
    }

    /// Re-creates a checkpointed entry with its check count and delay.
    pub fn restore(&self, id: &str, title: &str, check_count: u32, remaining: Duration) -> bool {
        let armed = lock(&self.shared.board).restore(id, title, check_count, now() + remaining);
        match armed {
            Some((at, generation)) => {
                self.arm(id, generation, at);
                true
            }
            None => false,
        }
    }

    pub fn unregister(&self, id: &str) -> bool {
        let removed = lock(&self.shared.board).remove(id).is_some();
        if removed {
            let _ = self.commands.send(MonitorCommand::Disarm(id.to_string()));
        }
        removed
    }

    pub fn is_monitoring(&self, id: &str) -> bool {
        lock(&self.shared.board).contains(id)
    }

    pub fn len(&self) -> usize {
        lock(&self.shared.board).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn entries(&self) -> Vec<MonitorEntry> {
        lock(&self.shared.board).iter().cloned().collect()
    }

    pub fn status(&self, next_scan_seconds: Option<u64>) -> MonitorStatusView {
        let tasks = lock(&self.shared.board).views(now());
        let logs = lock(&self.shared.logs).iter().cloned().collect();
        MonitorStatusView {
            tasks,
            logs,
            next_scan_seconds,
        }
    }

    /// Stops the timer worker. Pending ticks are abandoned; entries stay on
    /// the board for checkpointing.
    pub fn shutdown(&self) {
        let _ = self.commands.send(MonitorCommand::Shutdown);
    }

    fn arm(&self, id: &str, generation: u64, at: Instant) {
        let _ = self.commands.send(MonitorCommand::Arm {
            id: id.to_string(),
            generation,
            at,
        });
    }
}

async fn drive(shared: Arc<MonitorShared>, mut inbox: mpsc::UnboundedReceiver<MonitorCommand>) {
    let mut timers = Timers::default();
    let mut ticks: JoinSet<(Armed, Option<Instant>)> = JoinSet::new();

    loop {
        tokio::select! {
            command = inbox.recv() => match command {
                Some(MonitorCommand::Arm { id, generation, at }) => {
                    timers.arm(Armed { id, generation }, at);
                }
                Some(MonitorCommand::Disarm(id)) => timers.disarm(&id),
                Some(MonitorCommand::Shutdown) | None => break,
            },
            Some(expired) = timers.queue.next(), if !timers.queue.is_empty() => {
                let armed = expired.into_inner();
                timers.keys.remove(&armed.id);
                ticks.spawn(tick(shared.clone(), armed));
            }
            Some(joined) = ticks.join_next(), if !ticks.is_empty() => match joined {
                Ok((armed, Some(at))) => {
                    // Unregistered or replaced since the tick decided to go on.
                    let current = lock(&shared.board).generation(&armed.id);
                    if current == Some(armed.generation) {
                        timers.arm(armed, at);
                    }
                }
                Ok((_, None)) => {}
                Err(err) => sync_error!("monitor", "tick task aborted: {}", err),
            },
        }
    }
    sync_debug!("monitor", "timer worker stopped");
}

/// The registration a timer fires for.
struct Armed {
    id: String,
    generation: u64,
}

/// Delay queue plus the key of the single pending timer per id.
#[derive(Default)]
struct Timers {
    queue: DelayQueue<Armed>,
    keys: HashMap<String, delay_queue::Key>,
}

impl Timers {
    fn arm(&mut self, armed: Armed, at: Instant) {
        self.disarm(&armed.id);
        let id = armed.id.clone();
        let key = self.queue.insert_at(armed, tokio::time::Instant::from_std(at));
        self.keys.insert(id, key);
    }

    fn disarm(&mut self, id: &str) {
        if let Some(key) = self.keys.remove(id) {
            self.queue.remove(&key);
        }
    }
}

/// One check of one subscription. Returns when to check again, if ever.
async fn tick(shared: Arc<MonitorShared>, armed: Armed) -> (Armed, Option<Instant>) {
    let next = match AssertUnwindSafe(shared.check(&armed.id, armed.generation))
        .catch_unwind()
        .await
    {
        Ok(next) => next,
        Err(_) => {
            sync_error!("monitor", "check of {} panicked", armed.id);
            let step = lock(&shared.board).apply_current(
                &armed.id,
                armed.generation,
                MonitorMsg::FetchFailed("panicked".into()),
                now(),
            );
            match step {
                Some(MonitorStep::Reschedule { next_check, .. }) => Some(next_check),
                _ => None,
            }
        }
    };
    (armed, next)
}

impl MonitorShared {
    fn log(&self, title: &str, status: LogStatus, message: String) {
        let entry = LogEntry::now(title, status, message);
        mirror_log(&entry);
        lock(&self.logs).push(entry);
    }

    async fn check(&self, id: &str, generation: u64) -> Option<Instant> {
        let title = {
            let mut board = lock(&self.board);
            match board.apply_current(id, generation, MonitorMsg::CheckStarted, now()) {
                Some(MonitorStep::Fetch) => board.get(id).map(|entry| entry.title.clone())?,
                _ => return None,
            }
        };

        let fetched = self.catalog.subscription(id).await;
        let msg = match &fetched {
            Ok(None) => MonitorMsg::Missing,
            Ok(Some(record)) => match record.execution {
                ExecutionStatus::Failed => MonitorMsg::Failed,
                ExecutionStatus::Success => MonitorMsg::Succeeded {
                    complete: record.is_complete(),
                },
                ExecutionStatus::Pending | ExecutionStatus::Running => MonitorMsg::StillPending,
            },
            Err(err) => {
                sync_warn!("monitor", "{}: fetching subscription {} failed: {}", title, id, err);
                MonitorMsg::FetchFailed(err.to_string())
            }
        };

        // The entry may have been unregistered, or replaced by a new
        // registration, while the fetch was in flight.
        let (step, check_count, max_checks) = {
            let mut board = lock(&self.board);
            let (check_count, max_checks) = board
                .get(id)
                .filter(|entry| entry.generation == generation)
                .map(|entry| (entry.check_count, entry.max_checks))?;
            let step = board.apply_current(id, generation, msg, now())?;
            (step, check_count, max_checks)
        };

        match step {
            MonitorStep::Reschedule {
                next_check,
                log_progress,
            } => {
                if log_progress {
                    self.log(
                        &title,
                        LogStatus::Info,
                        format!("still waiting for execution ({check_count}/{max_checks})"),
                    );
                }
                Some(next_check)
            }
            MonitorStep::Terminal(TerminalKind::Deleted) => {
                self.log(
                    &title,
                    LogStatus::Warning,
                    "subscription was deleted, monitoring stopped".to_string(),
                );
                None
            }
            MonitorStep::Terminal(TerminalKind::Failed) => {
                self.log(
                    &title,
                    LogStatus::Error,
                    "subscription execution failed".to_string(),
                );
                None
            }
            MonitorStep::Terminal(TerminalKind::Expired) => {
                self.log(
                    &title,
                    LogStatus::Warning,
                    format!("no result after {max_checks} checks, monitoring stopped"),
                );
                None
            }
            MonitorStep::Terminal(TerminalKind::Succeeded { needs_search }) => {
                if let Ok(Some(record)) = fetched {
                    self.finish_success(record, needs_search).await;
                }
                None
            }
            MonitorStep::Fetch | MonitorStep::Ignored => None,
        }
    }

    async fn finish_success(&self, record: SubscriptionSnapshot, needs_search: bool) {
        if !needs_search {
            self.log(
                &record.title,
                LogStatus::Success,
                "subscription complete, no search needed".to_string(),
            );
            let auto_delete = lock(&self.auto_search).auto_delete_for(record.media_type);
            if auto_delete {
                match self.catalog.delete_subscription(&record.id).await {
                    Ok(()) => self.log(
                        &record.title,
                        LogStatus::Info,
                        "completed subscription deleted".to_string(),
                    ),
                    Err(err) => self.log(
                        &record.title,
                        LogStatus::Error,
                        format!("deleting completed subscription failed: {err}"),
                    ),
                }
            }
            return;
        }

        self.log(
            &record.title,
            LogStatus::Searching,
            format!("{} units missing, searching links", record.missing_units()),
        );
        match self
            .discovery
            .discover_links(&record.external_id, record.media_type)
            .await
        {
            Ok(links) if links.is_empty() => {
                self.log(&record.title, LogStatus::Warning, "no links found".to_string())
            }
            Ok(links) => match self.reconciler.merge(&record, &links).await {
                Ok(outcome) if outcome.added == 0 => self.log(
                    &record.title,
                    LogStatus::Info,
                    format!("all {} links already present", outcome.total),
                ),
                Ok(outcome) => self.log(
                    &record.title,
                    LogStatus::Success,
                    format!(
                        "added {} links ({} duplicate)",
                        outcome.added, outcome.duplicate
                    ),
                ),
                Err(MergeError::TriggerFailed { outcome, reason }) => self.log(
                    &record.title,
                    LogStatus::Warning,
                    format!(
                        "added {} links, but starting execution failed: {reason}",
                        outcome.added
                    ),
                ),
                Err(MergeError::Collaborator(err)) => self.log(
                    &record.title,
                    LogStatus::Error,
                    format!("saving links failed: {err}"),
                ),
            },
            Err(err) => self.log(
                &record.title,
                LogStatus::Error,
                format!("search failed: {err}"),
            ),
        }
    }
}
