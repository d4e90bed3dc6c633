use chrono::{DateTime, Duration, Utc};

use crate::MediaType;

pub const DEFAULT_INTERVAL_HOURS: u32 = 72;

/// Periodic full-reconciliation schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerState {
    pub enabled: bool,
    pub interval_hours: u32,
    pub next_run: Option<DateTime<Utc>>,
}

impl Default for SchedulerState {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_hours: DEFAULT_INTERVAL_HOURS,
            next_run: None,
        }
    }
}

impl SchedulerState {
    pub fn interval(&self) -> Duration {
        Duration::hours(i64::from(self.interval_hours.max(1)))
    }

    /// Enabling arms the next run one interval from `now`; disabling clears it.
    pub fn toggle(&mut self, enabled: bool, now: DateTime<Utc>) {
        self.enabled = enabled;
        self.next_run = enabled.then(|| now + self.interval());
    }

    pub fn set_interval_hours(&mut self, hours: u32, now: DateTime<Utc>) {
        self.interval_hours = hours.max(1);
        if self.enabled {
            self.next_run = Some(now + self.interval());
        }
    }

    pub fn due(&self, now: DateTime<Utc>) -> bool {
        self.enabled && self.next_run.is_some_and(|next| now >= next)
    }

    /// Moves the next run one interval past `now`.
    pub fn advance(&mut self, now: DateTime<Utc>) {
        if self.enabled {
            self.next_run = Some(now + self.interval());
        }
    }
}

/// Settings for watching newly created subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AutoSearchSettings {
    pub enabled: bool,
    pub auto_delete_completed_movie: bool,
    pub auto_delete_completed_tv: bool,
}

impl AutoSearchSettings {
    pub fn auto_delete_for(&self, media_type: MediaType) -> bool {
        match media_type {
            MediaType::Movie => self.auto_delete_completed_movie,
            MediaType::Tv => self.auto_delete_completed_tv,
        }
    }
}
