//! Runtime configuration read from `REELSYNC_*` environment variables.
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context};
use log::LevelFilter;
use reelsync_engine::{
    BridgeSettings, EmbySettings, EngineSettings, RestSettings, DEFAULT_BRIDGE_TIMEOUT,
};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub manager: RestSettings,
    pub library: Option<EmbySettings>,
    pub bridge: Option<BridgeSettings>,
    pub state_dir: PathBuf,
    pub log_level: LevelFilter,
    pub log_to_file: bool,
    pub checkpoint_interval: Duration,
    pub engine: EngineSettings,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. Blank values count as
    /// absent.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let seconds = |key: &str, default: u64| -> anyhow::Result<Duration> {
            match get(key) {
                Some(raw) => raw
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .with_context(|| format!("{key} must be a number of seconds, got {raw:?}")),
                None => Ok(Duration::from_secs(default)),
            }
        };

        let manager_url = get("REELSYNC_MANAGER_URL")
            .ok_or_else(|| anyhow!("REELSYNC_MANAGER_URL is required"))?;
        let mut manager = RestSettings::new(manager_url);
        manager.token = get("REELSYNC_MANAGER_TOKEN");

        let library = match (get("REELSYNC_LIBRARY_URL"), get("REELSYNC_LIBRARY_API_KEY")) {
            (Some(url), Some(key)) => Some(EmbySettings::new(url, key)),
            _ => None,
        };

        let bridge = match get("REELSYNC_BRIDGE_PROGRAM") {
            Some(program) => {
                let mut settings = BridgeSettings::new(program);
                settings.leading_args = get("REELSYNC_BRIDGE_SCRIPT").into_iter().collect();
                settings.extra_args = get("REELSYNC_BRIDGE_ARGS")
                    .map(|raw| raw.split_whitespace().map(str::to_string).collect())
                    .unwrap_or_default();
                settings.timeout =
                    seconds("REELSYNC_BRIDGE_TIMEOUT_SECS", DEFAULT_BRIDGE_TIMEOUT.as_secs())?;
                Some(settings)
            }
            None => None,
        };

        let log_level = match get("REELSYNC_LOG_LEVEL") {
            Some(raw) => raw
                .parse::<LevelFilter>()
                .with_context(|| format!("REELSYNC_LOG_LEVEL: unknown level {raw:?}"))?,
            None => LevelFilter::Info,
        };
        let log_to_file = get("REELSYNC_LOG_FILE")
            .map(|raw| !matches!(raw.to_ascii_lowercase().as_str(), "0" | "false" | "off" | "no"))
            .unwrap_or(true);

        let mut engine = EngineSettings::default();
        engine.scan_interval = seconds("REELSYNC_SCAN_INTERVAL_SECS", 60)?.max(Duration::from_secs(1));

        Ok(Self {
            manager,
            library,
            bridge,
            state_dir: get("REELSYNC_STATE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            log_level,
            log_to_file,
            checkpoint_interval: seconds("REELSYNC_CHECKPOINT_INTERVAL_SECS", 30)?
                .max(Duration::from_secs(1)),
            engine,
        })
    }
}
