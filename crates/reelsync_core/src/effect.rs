use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalKind {
    /// Execution succeeded; `needs_search` when units are still missing.
    Succeeded { needs_search: bool },
    Failed,
    Deleted,
    /// Gave up after the maximum number of checks.
    Expired,
}

/// What the driver must do after feeding a message to a monitor entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorStep {
    /// Fetch the authoritative record and feed back the observation.
    Fetch,
    /// Arm the timer again; emit a progress line when `log_progress`.
    Reschedule {
        next_check: Instant,
        log_progress: bool,
    },
    /// The entry is finished and has been dropped from the board.
    Terminal(TerminalKind),
    /// The message did not apply to the entry's current phase.
    Ignored,
}
