use std::time::Instant;

use crate::{MonitorEntry, MonitorMsg, MonitorPhase, MonitorStep, TerminalKind};

/// A progress line is emitted on every Nth pending check.
const PROGRESS_LOG_EVERY: u32 = 5;

/// Pure update function: applies a message to a monitor entry and returns the
/// step the driver has to carry out.
pub fn update(mut entry: MonitorEntry, msg: MonitorMsg, now: Instant) -> (MonitorEntry, MonitorStep) {
    if entry.phase != MonitorPhase::Monitoring {
        return (entry, MonitorStep::Ignored);
    }

    let step = match msg {
        MonitorMsg::CheckStarted => {
            entry.check_count += 1;
            MonitorStep::Fetch
        }
        MonitorMsg::Missing => terminate(&mut entry, TerminalKind::Deleted),
        MonitorMsg::Failed => terminate(&mut entry, TerminalKind::Failed),
        MonitorMsg::Succeeded { complete } => terminate(
            &mut entry,
            TerminalKind::Succeeded {
                needs_search: !complete,
            },
        ),
        MonitorMsg::StillPending | MonitorMsg::FetchFailed(_) => {
            if entry.is_exhausted() {
                terminate(&mut entry, TerminalKind::Expired)
            } else {
                entry.next_check = now + entry.interval;
                MonitorStep::Reschedule {
                    next_check: entry.next_check,
                    log_progress: entry.check_count % PROGRESS_LOG_EVERY == 0,
                }
            }
        }
    };

    (entry, step)
}

fn terminate(entry: &mut MonitorEntry, kind: TerminalKind) -> MonitorStep {
    entry.phase = MonitorPhase::Terminal(kind);
    MonitorStep::Terminal(kind)
}
