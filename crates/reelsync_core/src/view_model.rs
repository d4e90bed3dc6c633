use crate::LogEntry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorTaskView {
    pub id: String,
    pub title: String,
    pub check_count: u32,
    pub max_checks: u32,
    pub remaining_seconds: u64,
}

/// Snapshot for the new-subscription monitor panel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MonitorStatusView {
    pub tasks: Vec<MonitorTaskView>,
    /// Newest first.
    pub logs: Vec<LogEntry>,
    /// Seconds until the next new-item scan; `None` while scanning is off.
    pub next_scan_seconds: Option<u64>,
}
