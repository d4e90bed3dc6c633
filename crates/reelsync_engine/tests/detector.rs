mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::{movie, show, FakeDiscovery, FakeManager};
use pretty_assertions::assert_eq;
use reelsync_core::AutoSearchSettings;
use reelsync_engine::{Collaborators, EngineSettings, Orchestrator, UnconfiguredLibrary};
use tokio::runtime::Handle;

fn orchestrator(manager: Arc<FakeManager>) -> Orchestrator {
    let orchestrator = Orchestrator::new(
        Collaborators {
            manager,
            library: Arc::new(UnconfiguredLibrary),
            discovery: FakeDiscovery::new(),
        },
        &EngineSettings::default(),
        Handle::current(),
    );
    orchestrator.set_auto_search(AutoSearchSettings {
        enabled: true,
        ..AutoSearchSettings::default()
    });
    orchestrator
}

fn ids(items: &[reelsync_core::SubscriptionSnapshot]) -> Vec<&str> {
    items.iter().map(|item| item.id.as_str()).collect()
}

#[tokio::test(start_paused = true)]
async fn first_scan_primes_without_reporting() {
    common::init_logging();
    let manager = FakeManager::with(vec![movie("B", "Heat"), movie("A", "Alien")]);
    let orchestrator = orchestrator(manager);

    assert!(orchestrator.detector().scan().await.is_empty());
    assert!(orchestrator.monitor().is_empty());
    assert!(orchestrator.detector().known_ids().is_primed());
}

#[tokio::test(start_paused = true)]
async fn items_above_the_boundary_are_new_and_monitored() {
    common::init_logging();
    let manager = FakeManager::with(vec![movie("B", "Heat"), movie("A", "Alien")]);
    let orchestrator = orchestrator(manager.clone());
    orchestrator.detector().scan().await;

    manager.push_newest(show("C", "Dark", 0, 8));
    manager.push_newest(movie("D", "Ran"));
    let fresh = orchestrator.detector().scan().await;

    assert_eq!(ids(&fresh), vec!["D", "C"]);
    assert!(orchestrator.monitor().is_monitoring("C"));
    assert!(orchestrator.monitor().is_monitoring("D"));
    assert!(orchestrator.detector().scan().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn disabled_auto_search_skips_the_collaborator() {
    common::init_logging();
    let manager = FakeManager::with(vec![movie("A", "Alien")]);
    let orchestrator = orchestrator(manager.clone());
    orchestrator.set_auto_search(AutoSearchSettings::default());

    assert!(orchestrator.detector().scan().await.is_empty());
    assert_eq!(manager.list_calls.load(Ordering::SeqCst), 0);
    assert_eq!(orchestrator.detector().next_scan_seconds(), None);
}

#[tokio::test(start_paused = true)]
async fn failed_list_load_does_not_prime() {
    common::init_logging();
    let manager = FakeManager::with(vec![movie("A", "Alien")]);
    manager.fail_list.store(true, Ordering::SeqCst);
    let orchestrator = orchestrator(manager.clone());

    orchestrator.detector().scan().await;
    assert!(!orchestrator.detector().known_ids().is_primed());

    manager.fail_list.store(false, Ordering::SeqCst);
    assert!(orchestrator.detector().scan().await.is_empty());
    assert!(orchestrator.monitor().is_empty());
}

#[tokio::test(start_paused = true)]
async fn reset_re_primes_on_next_scan() {
    common::init_logging();
    let manager = FakeManager::with(vec![movie("A", "Alien")]);
    let orchestrator = orchestrator(manager.clone());
    orchestrator.detector().scan().await;

    orchestrator.detector().reset();
    manager.push_newest(movie("B", "Heat"));
    assert!(orchestrator.detector().scan().await.is_empty());
    assert_eq!(orchestrator.detector().known_ids().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn next_scan_counts_down_from_the_last_scan() {
    common::init_logging();
    let orchestrator = orchestrator(FakeManager::with(vec![movie("A", "Alien")]));
    assert_eq!(orchestrator.detector().next_scan_seconds(), None);

    orchestrator.detector().scan().await;
    tokio::time::advance(std::time::Duration::from_secs(15)).await;
    assert_eq!(orchestrator.detector().next_scan_seconds(), Some(45));
    assert_eq!(orchestrator.monitor_status().next_scan_seconds, Some(45));
}
