mod common;

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{links, movie, show, FakeDiscovery, FakeManager};
use reelsync_core::{AutoSearchSettings, ExecutionStatus, LogStatus};
use reelsync_engine::{
    Catalog, EngineSettings, LinkReconciler, SubscriptionMonitor, UnconfiguredLibrary,
};
use tokio::runtime::Handle;

const MINUTE: Duration = Duration::from_secs(60);

struct Rig {
    manager: Arc<FakeManager>,
    discovery: Arc<FakeDiscovery>,
    auto_search: Arc<Mutex<AutoSearchSettings>>,
    monitor: SubscriptionMonitor,
}

fn rig(manager: Arc<FakeManager>) -> Rig {
    let settings = EngineSettings::default();
    let discovery = FakeDiscovery::new();
    let catalog = Arc::new(Catalog::new(
        manager.clone(),
        Arc::new(UnconfiguredLibrary),
        &settings,
    ));
    let reconciler = Arc::new(LinkReconciler::new(catalog.clone()));
    let auto_search = Arc::new(Mutex::new(AutoSearchSettings {
        enabled: true,
        ..AutoSearchSettings::default()
    }));
    let monitor = SubscriptionMonitor::new(
        catalog,
        discovery.clone(),
        reconciler,
        auto_search.clone(),
        &settings,
        &Handle::current(),
    );
    Rig {
        manager,
        discovery,
        auto_search,
        monitor,
    }
}

fn log_statuses(monitor: &SubscriptionMonitor) -> Vec<LogStatus> {
    monitor.status(None).logs.iter().map(|entry| entry.status).collect()
}

#[tokio::test(start_paused = true)]
async fn pending_subscription_expires_after_sixty_checks() {
    common::init_logging();
    let dark = show("1", "Dark", 0, 8);
    let rig = rig(FakeManager::with(vec![dark.clone()]));
    assert!(rig.monitor.register(&dark));

    tokio::time::sleep(MINUTE * 59 + Duration::from_secs(30)).await;
    let view = rig.monitor.status(None);
    assert_eq!(view.tasks.len(), 1);
    assert_eq!(view.tasks[0].check_count, 59);
    assert_eq!(view.tasks[0].max_checks, 60);
    assert!((29..=30).contains(&view.tasks[0].remaining_seconds));

    tokio::time::sleep(MINUTE).await;
    assert!(!rig.monitor.is_monitoring("1"));
    assert_eq!(rig.manager.fetch_calls.load(Ordering::SeqCst), 60);

    let statuses = log_statuses(&rig.monitor);
    // Newest first: expiry, eleven progress lines, registration.
    assert_eq!(statuses.len(), 13);
    assert_eq!(statuses[0], LogStatus::Warning);
    assert!(statuses[1..].iter().all(|status| *status == LogStatus::Info));

    tokio::time::sleep(MINUTE * 10).await;
    assert_eq!(rig.manager.fetch_calls.load(Ordering::SeqCst), 60);
}

#[tokio::test(start_paused = true)]
async fn fetch_errors_consume_checks() {
    common::init_logging();
    let dark = show("1", "Dark", 0, 8);
    let rig = rig(FakeManager::with(vec![dark.clone()]));
    rig.manager.fail_fetch.store(true, Ordering::SeqCst);
    rig.monitor.register(&dark);

    tokio::time::sleep(MINUTE * 61).await;
    assert!(!rig.monitor.is_monitoring("1"));
    assert_eq!(rig.manager.fetch_calls.load(Ordering::SeqCst), 60);
}

#[tokio::test(start_paused = true)]
async fn success_with_missing_units_searches_and_merges() {
    common::init_logging();
    let dark = show("1", "Dark", 2, 8);
    let rig = rig(FakeManager::with(vec![dark.clone()]));
    rig.discovery.answer("tmdb-1", Ok(links(&["a", "b"])));
    rig.monitor.register(&dark);

    tokio::time::sleep(MINUTE * 2 + Duration::from_secs(1)).await;
    assert!(rig.monitor.is_monitoring("1"));

    rig.manager
        .edit("1", |sub| sub.execution = ExecutionStatus::Success);
    tokio::time::sleep(MINUTE).await;

    assert!(rig.monitor.is_empty());
    assert_eq!(rig.discovery.calls(), 1);
    assert_eq!(rig.manager.get("1").unwrap().links, links(&["a", "b"]));
    assert_eq!(rig.manager.trigger_calls.load(Ordering::SeqCst), 1);
    assert_eq!(log_statuses(&rig.monitor)[0], LogStatus::Success);
}

#[tokio::test(start_paused = true)]
async fn complete_subscription_is_auto_deleted_when_enabled() {
    common::init_logging();
    let mut heat = movie("1", "Heat");
    heat.execution = ExecutionStatus::Success;
    heat.subscribed_units = 1;
    let rig = rig(FakeManager::with(vec![heat.clone()]));
    rig.auto_search.lock().unwrap().auto_delete_completed_movie = true;
    rig.monitor.register(&heat);

    tokio::time::sleep(MINUTE + Duration::from_secs(1)).await;
    assert!(rig.monitor.is_empty());
    assert_eq!(rig.discovery.calls(), 0);
    assert_eq!(rig.manager.delete_calls.load(Ordering::SeqCst), 1);
    assert!(rig.manager.get("1").is_none());
}

#[tokio::test(start_paused = true)]
async fn complete_subscription_is_kept_when_policy_is_off() {
    common::init_logging();
    let mut dark = show("1", "Dark", 8, 8);
    dark.execution = ExecutionStatus::Success;
    let rig = rig(FakeManager::with(vec![dark.clone()]));
    rig.auto_search.lock().unwrap().auto_delete_completed_movie = true;
    rig.monitor.register(&dark);

    tokio::time::sleep(MINUTE + Duration::from_secs(1)).await;
    assert!(rig.monitor.is_empty());
    assert_eq!(rig.manager.delete_calls.load(Ordering::SeqCst), 0);
    assert_eq!(log_statuses(&rig.monitor)[0], LogStatus::Success);
}

#[tokio::test(start_paused = true)]
async fn deleted_and_failed_subscriptions_stop_monitoring() {
    common::init_logging();
    let dark = show("1", "Dark", 0, 8);
    let lost = show("2", "Lost", 0, 9);
    let rig = rig(FakeManager::with(vec![dark.clone(), lost.clone()]));
    rig.monitor.register(&dark);
    rig.monitor.register(&lost);

    rig.manager.remove("1");
    rig.manager
        .edit("2", |sub| sub.execution = ExecutionStatus::Failed);
    tokio::time::sleep(MINUTE + Duration::from_secs(1)).await;

    assert!(rig.monitor.is_empty());
    let statuses = log_statuses(&rig.monitor);
    assert!(statuses.contains(&LogStatus::Warning));
    assert!(statuses.contains(&LogStatus::Error));
    assert_eq!(rig.discovery.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn duplicate_registration_is_a_no_op() {
    common::init_logging();
    let dark = show("1", "Dark", 0, 8);
    let rig = rig(FakeManager::with(vec![dark.clone()]));

    assert!(rig.monitor.register(&dark));
    assert!(!rig.monitor.register(&dark));
    tokio::time::sleep(MINUTE + Duration::from_secs(1)).await;
    assert_eq!(rig.manager.fetch_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn unregistered_entry_is_never_checked() {
    common::init_logging();
    let dark = show("1", "Dark", 0, 8);
    let rig = rig(FakeManager::with(vec![dark.clone()]));

    rig.monitor.register(&dark);
    assert!(rig.monitor.unregister("1"));
    assert!(!rig.monitor.unregister("1"));
    tokio::time::sleep(MINUTE * 5).await;
    assert_eq!(rig.manager.fetch_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn re_registering_during_a_fetch_keeps_a_single_timer() {
    common::init_logging();
    let dark = show("1", "Dark", 0, 8);
    let rig = rig(FakeManager::with(vec![dark.clone()]));
    let gate = rig.manager.gate_next_fetch();

    rig.monitor.register(&dark);
    tokio::time::sleep(MINUTE + Duration::from_secs(1)).await;
    assert_eq!(rig.manager.fetch_calls.load(Ordering::SeqCst), 1);

    assert!(rig.monitor.unregister("1"));
    assert!(rig.monitor.register(&dark));
    gate.notify_one();

    // Ticks of the new registration land at 1, 2, ... 10 minutes from now.
    tokio::time::sleep(MINUTE * 10 + Duration::from_secs(30)).await;
    assert_eq!(rig.manager.fetch_calls.load(Ordering::SeqCst), 11);
    let view = rig.monitor.status(None);
    assert_eq!(view.tasks.len(), 1);
    assert_eq!(view.tasks[0].check_count, 10);
    assert!((29..=30).contains(&view.tasks[0].remaining_seconds));
}

#[tokio::test(start_paused = true)]
async fn restored_entry_resumes_its_count() {
    common::init_logging();
    let dark = show("1", "Dark", 0, 8);
    let rig = rig(FakeManager::with(vec![dark.clone()]));

    assert!(rig.monitor.restore("1", "Dark", 58, Duration::from_secs(10)));
    tokio::time::sleep(Duration::from_secs(11)).await;
    assert_eq!(rig.monitor.entries()[0].check_count, 59);

    tokio::time::sleep(MINUTE).await;
    assert!(!rig.monitor.is_monitoring("1"));
    assert_eq!(rig.manager.fetch_calls.load(Ordering::SeqCst), 2);
}
