mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reelsync_engine::TtlCache;

const TTL: Duration = Duration::from_secs(300);

async fn load_counted(
    cache: &TtlCache<(), u32>,
    calls: &AtomicUsize,
    value: u32,
    force: bool,
) -> u32 {
    cache
        .get((), TTL, force, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(value)
        })
        .await
}

#[tokio::test(start_paused = true)]
async fn loader_runs_once_within_ttl() {
    common::init_logging();
    let cache = TtlCache::new("numbers");
    let calls = AtomicUsize::new(0);

    assert_eq!(load_counted(&cache, &calls, 1, false).await, 1);
    tokio::time::advance(Duration::from_secs(299)).await;
    assert_eq!(load_counted(&cache, &calls, 2, false).await, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn expired_entry_is_reloaded() {
    common::init_logging();
    let cache = TtlCache::new("numbers");
    let calls = AtomicUsize::new(0);

    load_counted(&cache, &calls, 1, false).await;
    tokio::time::advance(TTL).await;
    assert_eq!(cache.peek(&()), None);
    assert_eq!(load_counted(&cache, &calls, 2, false).await, 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn forced_refresh_bypasses_live_entry() {
    common::init_logging();
    let cache = TtlCache::new("numbers");
    let calls = AtomicUsize::new(0);

    load_counted(&cache, &calls, 1, false).await;
    assert_eq!(load_counted(&cache, &calls, 7, true).await, 7);
    assert_eq!(cache.peek(&()), Some(7));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn failed_load_serves_stale_value() {
    common::init_logging();
    let cache = TtlCache::new("numbers");
    let calls = AtomicUsize::new(0);

    load_counted(&cache, &calls, 5, false).await;
    tokio::time::advance(TTL * 2).await;

    let served = cache
        .get((), TTL, false, || async { Err::<u32, _>("upstream down") })
        .await;
    assert_eq!(served, 5);
}

#[tokio::test(start_paused = true)]
async fn failed_load_with_nothing_cached_yields_default() {
    common::init_logging();
    let cache: TtlCache<&'static str, Vec<String>> = TtlCache::new("lists");

    let served = cache
        .get("key", TTL, false, || async { Err::<Vec<String>, _>("boom") })
        .await;
    assert!(served.is_empty());
    assert!(cache.is_empty());
}

#[tokio::test(start_paused = true)]
async fn invalidating_a_source_clears_derived_caches() {
    common::init_logging();
    let source: TtlCache<(), u32> = TtlCache::new("source");
    let derived = Arc::new(TtlCache::<(), u32>::new("derived"));
    let pages = Arc::new(TtlCache::<usize, u32>::new("pages"));
    source.cascade_to(derived.clone());
    derived.cascade_to(pages.clone());

    source.get((), TTL, false, || async { Ok::<_, String>(1) }).await;
    derived.get((), TTL, false, || async { Ok::<_, String>(2) }).await;
    for page in 1..=3 {
        pages.get(page, TTL, false, || async { Ok::<_, String>(3) }).await;
    }
    assert_eq!(pages.len(), 3);

    source.invalidate(&());
    assert!(source.is_empty());
    assert!(derived.is_empty());
    assert!(pages.is_empty());
}

#[tokio::test(start_paused = true)]
async fn load_started_before_invalidation_is_not_stored() {
    common::init_logging();
    let cache = Arc::new(TtlCache::<(), u32>::new("numbers"));
    let started = Arc::new(tokio::sync::Notify::new());
    let release = Arc::new(tokio::sync::Notify::new());

    let loading = {
        let cache = cache.clone();
        let started = started.clone();
        let release = release.clone();
        tokio::spawn(async move {
            cache
                .get((), TTL, false, || async move {
                    started.notify_one();
                    release.notified().await;
                    Ok::<_, String>(1)
                })
                .await
        })
    };
    started.notified().await;

    cache.invalidate_all();
    release.notify_one();
    assert_eq!(loading.await.unwrap(), 1);
    assert_eq!(cache.peek(&()), None);
}
