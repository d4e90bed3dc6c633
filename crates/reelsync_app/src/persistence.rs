use std::path::Path;

use chrono::{DateTime, Utc};
use reelsync_core::{AutoSearchSettings, SchedulerState};
use reelsync_engine::{Checkpoint, CheckpointFile, MonitorCheckpoint};
use reelsync_logging::{sync_error, sync_info, sync_warn};
use serde::{Deserialize, Serialize};

const STATE_FILENAME: &str = ".reelsync_state.ron";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedMonitor {
    id: String,
    title: String,
    check_count: u32,
    remaining_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PersistedAutoSearch {
    enabled: bool,
    auto_delete_completed_movie: bool,
    auto_delete_completed_tv: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedScheduler {
    enabled: bool,
    interval_hours: u32,
    next_run: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedState {
    #[serde(default)]
    monitors: Vec<PersistedMonitor>,
    #[serde(default)]
    known_ids: Vec<String>,
    #[serde(default)]
    known_ids_primed: bool,
    #[serde(default)]
    auto_search: PersistedAutoSearch,
    #[serde(default)]
    scheduler: Option<PersistedScheduler>,
}

impl From<&Checkpoint> for PersistedState {
    fn from(checkpoint: &Checkpoint) -> Self {
        Self {
            monitors: checkpoint
                .monitors
                .iter()
                .map(|entry| PersistedMonitor {
                    id: entry.id.clone(),
                    title: entry.title.clone(),
                    check_count: entry.check_count,
                    remaining_seconds: entry.remaining_seconds,
                })
                .collect(),
            known_ids: checkpoint.known_ids.clone(),
            known_ids_primed: checkpoint.known_ids_primed,
            auto_search: PersistedAutoSearch {
                enabled: checkpoint.auto_search.enabled,
                auto_delete_completed_movie: checkpoint.auto_search.auto_delete_completed_movie,
                auto_delete_completed_tv: checkpoint.auto_search.auto_delete_completed_tv,
            },
            scheduler: Some(PersistedScheduler {
                enabled: checkpoint.scheduler.enabled,
                interval_hours: checkpoint.scheduler.interval_hours,
                next_run: checkpoint.scheduler.next_run,
            }),
        }
    }
}

impl From<PersistedState> for Checkpoint {
    fn from(state: PersistedState) -> Self {
        Self {
            monitors: state
                .monitors
                .into_iter()
                .map(|entry| MonitorCheckpoint {
                    id: entry.id,
                    title: entry.title,
                    check_count: entry.check_count,
                    remaining_seconds: entry.remaining_seconds,
                })
                .collect(),
            known_ids: state.known_ids,
            known_ids_primed: state.known_ids_primed,
            auto_search: AutoSearchSettings {
                enabled: state.auto_search.enabled,
                auto_delete_completed_movie: state.auto_search.auto_delete_completed_movie,
                auto_delete_completed_tv: state.auto_search.auto_delete_completed_tv,
            },
            scheduler: state
                .scheduler
                .map(|scheduler| SchedulerState {
                    enabled: scheduler.enabled,
                    interval_hours: scheduler.interval_hours,
                    next_run: scheduler.next_run,
                })
                .unwrap_or_default(),
        }
    }
}

/// Reads the last checkpoint. Missing, unreadable or corrupt files yield
/// `None` and the service starts fresh.
pub(crate) fn load_checkpoint(state_dir: &Path) -> Option<Checkpoint> {
    let file = CheckpointFile::new(state_dir, STATE_FILENAME);
    let content = match file.read() {
        Ok(Some(text)) => text,
        Ok(None) => return None,
        Err(err) => {
            sync_warn!("persistence", "Failed to read checkpoint: {}", err);
            return None;
        }
    };

    let state: PersistedState = match ron::from_str(&content) {
        Ok(state) => state,
        Err(err) => {
            sync_warn!("persistence", "Failed to parse checkpoint from {:?}: {}", file.path(), err);
            return None;
        }
    };

    sync_info!(
        "persistence",
        "Loaded checkpoint with {} monitors from {:?}",
        state.monitors.len(),
        file.path()
    );
    Some(state.into())
}

pub(crate) fn save_checkpoint(state_dir: &Path, checkpoint: &Checkpoint) {
    let state = PersistedState::from(checkpoint);
    let pretty = ron::ser::PrettyConfig::new();
    let content = match ron::ser::to_string_pretty(&state, pretty) {
        Ok(text) => text,
        Err(err) => {
            sync_error!("persistence", "Failed to serialize checkpoint: {}", err);
            return;
        }
    };

    if let Err(err) = CheckpointFile::new(state_dir, STATE_FILENAME).write(&content) {
        sync_error!("persistence", "Failed to save checkpoint: {}", err);
    }
}
