use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::{update, MonitorMsg, MonitorStep, MonitorTaskView, TerminalKind};

pub const DEFAULT_MAX_CHECKS: u32 = 60;
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorPhase {
    Monitoring,
    Terminal(TerminalKind),
}

/// Polling state for one in-flight subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorEntry {
    pub id: String,
    pub title: String,
    pub check_count: u32,
    pub max_checks: u32,
    pub interval: Duration,
    pub next_check: Instant,
    pub phase: MonitorPhase,
    /// Distinguishes this registration from earlier ones under the same id.
    pub generation: u64,
}

impl MonitorEntry {
    pub fn new(id: impl Into<String>, title: impl Into<String>, interval: Duration, now: Instant) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            check_count: 0,
            max_checks: DEFAULT_MAX_CHECKS,
            interval,
            next_check: now + interval,
            phase: MonitorPhase::Monitoring,
            generation: 0,
        }
    }

    pub fn remaining_seconds(&self, now: Instant) -> u64 {
        self.next_check.saturating_duration_since(now).as_secs()
    }

    pub fn is_exhausted(&self) -> bool {
        self.check_count >= self.max_checks
    }
}

/// All monitored subscriptions keyed by id. A pending tick may only mutate
/// the entry whose id and generation it was armed for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorBoard {
    entries: BTreeMap<String, MonitorEntry>,
    interval: Duration,
    max_checks: u32,
    last_generation: u64,
}

impl Default for MonitorBoard {
    fn default() -> Self {
        Self::new(DEFAULT_CHECK_INTERVAL, DEFAULT_MAX_CHECKS)
    }
}

impl MonitorBoard {
    pub fn new(interval: Duration, max_checks: u32) -> Self {
        Self {
            entries: BTreeMap::new(),
            interval,
            max_checks: max_checks.max(1),
            last_generation: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Starts monitoring `id`. Returns the first check time and the entry's
    /// generation, or `None` when the id is already monitored.
    pub fn register(&mut self, id: &str, title: &str, now: Instant) -> Option<(Instant, u64)> {
        if self.entries.contains_key(id) {
            return None;
        }
        let entry = MonitorEntry::new(id, title, self.interval, now);
        Some(self.insert(entry))
    }

    /// Re-creates an entry from a checkpoint, keeping its progress.
    pub fn restore(
        &mut self,
        id: &str,
        title: &str,
        check_count: u32,
        next_check: Instant,
    ) -> Option<(Instant, u64)> {
        if self.entries.contains_key(id) {
            return None;
        }
        let mut entry = MonitorEntry::new(id, title, self.interval, next_check);
        entry.check_count = check_count.min(self.max_checks.saturating_sub(1));
        entry.next_check = next_check;
        Some(self.insert(entry))
    }

    fn insert(&mut self, mut entry: MonitorEntry) -> (Instant, u64) {
        self.last_generation += 1;
        entry.generation = self.last_generation;
        entry.max_checks = self.max_checks;
        let armed = (entry.next_check, entry.generation);
        self.entries.insert(entry.id.clone(), entry);
        armed
    }

    /// Generation of the live entry for `id`, if any.
    pub fn generation(&self, id: &str) -> Option<u64> {
        self.entries.get(id).map(|entry| entry.generation)
    }

    pub fn get(&self, id: &str) -> Option<&MonitorEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<MonitorEntry> {
        self.entries.remove(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MonitorEntry> {
        self.entries.values()
    }

    /// Feeds `msg` to the entry for `id`. Terminal steps drop the entry.
    /// `None` when the id is not (or no longer) monitored.
    pub fn apply(&mut self, id: &str, msg: MonitorMsg, now: Instant) -> Option<MonitorStep> {
        let entry = self.entries.remove(id)?;
        let (entry, step) = update(entry, msg, now);
        if !matches!(entry.phase, MonitorPhase::Terminal(_)) {
            self.entries.insert(id.to_string(), entry);
        }
        Some(step)
    }

    /// Like [`MonitorBoard::apply`], but only when `id` is still the
    /// registration numbered `generation`. A tick armed for an entry that was
    /// unregistered and registered again gets `None` and must not reschedule.
    pub fn apply_current(
        &mut self,
        id: &str,
        generation: u64,
        msg: MonitorMsg,
        now: Instant,
    ) -> Option<MonitorStep> {
        if self.generation(id)? != generation {
            return None;
        }
        self.apply(id, msg, now)
    }

    pub fn views(&self, now: Instant) -> Vec<MonitorTaskView> {
        self.entries
            .values()
            .map(|entry| MonitorTaskView {
                id: entry.id.clone(),
                title: entry.title.clone(),
                check_count: entry.check_count,
                max_checks: entry.max_checks,
                remaining_seconds: entry.remaining_seconds(now),
            })
            .collect()
    }
}
