use std::collections::VecDeque;

use chrono::{DateTime, Utc};

pub const DEFAULT_LOG_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStatus {
    Info,
    Success,
    Warning,
    Error,
    Searching,
}

impl LogStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LogStatus::Info => "info",
            LogStatus::Success => "success",
            LogStatus::Warning => "warning",
            LogStatus::Error => "error",
            LogStatus::Searching => "searching",
        }
    }
}

/// A user-facing log line shown in the dashboard's log panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub time: DateTime<Utc>,
    pub title: String,
    pub status: LogStatus,
    pub message: String,
}

impl LogEntry {
    pub fn now(title: impl Into<String>, status: LogStatus, message: impl Into<String>) -> Self {
        Self {
            time: Utc::now(),
            title: title.into(),
            status,
            message: message.into(),
        }
    }
}

/// Bounded log, newest entry first. Appending past capacity drops the oldest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRing {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl Default for LogRing {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }
}

impl LogRing {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Newest first.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.front()
    }
}
