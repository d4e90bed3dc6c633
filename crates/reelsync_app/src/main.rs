mod config;
mod logging;
mod persistence;
mod service;

use std::sync::Arc;

use anyhow::Context;
use reelsync_engine::{
    BridgeLinkDiscovery, Collaborators, EmbyLibrary, LibraryInventory, LinkDiscovery,
    Orchestrator, RestSubscriptionManager, UnconfiguredDiscovery, UnconfiguredLibrary,
};
use reelsync_logging::{sync_info, sync_warn};
use tokio::runtime::Handle;

use crate::config::AppConfig;

fn collaborators(config: &AppConfig) -> anyhow::Result<Collaborators> {
    let manager = RestSubscriptionManager::new(config.manager.clone())
        .context("invalid subscription manager configuration")?;

    let library: Arc<dyn LibraryInventory> = match &config.library {
        Some(settings) => Arc::new(
            EmbyLibrary::new(settings.clone()).context("invalid library configuration")?,
        ),
        None => {
            sync_warn!("app", "media library not configured, membership checks disabled");
            Arc::new(UnconfiguredLibrary)
        }
    };

    let discovery: Arc<dyn LinkDiscovery> = match &config.bridge {
        Some(settings) => Arc::new(BridgeLinkDiscovery::new(settings.clone())),
        None => {
            sync_warn!("app", "link discovery not configured, searches find nothing");
            Arc::new(UnconfiguredDiscovery)
        }
    };

    Ok(Collaborators {
        manager: Arc::new(manager),
        library,
        discovery,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    logging::initialize(config.log_level, config.log_to_file);

    let orchestrator = Orchestrator::new(collaborators(&config)?, &config.engine, Handle::current());
    if let Some(checkpoint) = persistence::load_checkpoint(&config.state_dir) {
        orchestrator.restore(checkpoint);
    }
    sync_info!(
        "app",
        "reelsync started, state dir {:?}, scan every {:?}",
        config.state_dir,
        config.engine.scan_interval
    );

    service::run(
        &orchestrator,
        config.engine.scan_interval,
        config.checkpoint_interval,
        &config.state_dir,
    )
    .await
}
