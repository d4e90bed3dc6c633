//! Periodic drivers around the orchestrator.
use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use reelsync_engine::Orchestrator;
use reelsync_logging::{sync_debug, sync_info};
use tokio::time::{interval, MissedTickBehavior};

use crate::persistence::save_checkpoint;

const SCHEDULER_CHECK: Duration = Duration::from_secs(60);

/// Runs the new-item scan, the scheduler check and checkpoint writes until
/// Ctrl-C, then stops the batch, writes a final checkpoint and stops the
/// monitor worker.
pub async fn run(
    orchestrator: &Orchestrator,
    scan_every: Duration,
    checkpoint_every: Duration,
    state_dir: &Path,
) -> anyhow::Result<()> {
    let mut scan = interval(scan_every);
    let mut schedule = interval(SCHEDULER_CHECK);
    let mut checkpoint = interval(checkpoint_every);
    for timer in [&mut scan, &mut schedule, &mut checkpoint] {
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    }

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            signal = &mut shutdown => {
                signal?;
                sync_info!("service", "shutdown requested");
                break;
            }
            _ = scan.tick() => {
                let fresh = orchestrator.detector().scan().await;
                if !fresh.is_empty() {
                    sync_info!("service", "now monitoring {} subscriptions", orchestrator.monitor().len());
                }
            }
            _ = schedule.tick() => {
                if let Some(receipt) = orchestrator.run_scheduled(Utc::now()).await {
                    sync_debug!("service", "scheduled run receipt: {:?}", receipt);
                }
            }
            _ = checkpoint.tick() => {
                save_checkpoint(state_dir, &orchestrator.checkpoint());
            }
        }
    }

    orchestrator.shutdown();
    save_checkpoint(state_dir, &orchestrator.checkpoint());
    sync_info!("service", "final checkpoint written to {:?}", state_dir);
    Ok(())
}
