/// Inputs to the per-subscription monitor state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorMsg {
    /// The entry's timer fired; a new check begins.
    CheckStarted,
    /// The subscription no longer exists upstream.
    Missing,
    /// The downstream execution reported failure.
    Failed,
    /// The downstream execution succeeded.
    Succeeded { complete: bool },
    /// The execution has not resolved yet.
    StillPending,
    /// The authoritative record could not be fetched this tick.
    FetchFailed(String),
}
