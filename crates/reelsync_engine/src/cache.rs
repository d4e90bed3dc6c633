use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reelsync_logging::{sync_debug, sync_warn};
use tokio::time::Instant;

use crate::lock;

/// Something whose contents can be dropped wholesale when a source changes.
pub trait Invalidate: Send + Sync {
    fn invalidate_all(&self);
}

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

struct Slots<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    /// Bumped on every invalidation. A load that began under an older epoch
    /// hands its value to its caller but never stores it.
    epoch: u64,
}

/// TTL-memoized getter with stale fallback and cascading invalidation.
///
/// Values are trusted only while `now < expires_at`. When a loader fails, the
/// last stored value for the key is served even if expired; with nothing
/// stored, [`TtlCache::get`] hands out `V::default()` and
/// [`TtlCache::try_get`] the error. Caches are best effort and never the
/// source of truth for correctness-critical decisions.
pub struct TtlCache<K, V> {
    name: &'static str,
    slots: Mutex<Slots<K, V>>,
    dependents: Mutex<Vec<Arc<dyn Invalidate>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Debug + Send,
    V: Clone + Default + Send,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            slots: Mutex::new(Slots {
                entries: HashMap::new(),
                epoch: 0,
            }),
            dependents: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Registers a cache derived from this one. Invalidating any key here
    /// clears `dependent` entirely. The dependency graph must stay acyclic.
    pub fn cascade_to(&self, dependent: Arc<dyn Invalidate>) {
        lock(&self.dependents).push(dependent);
    }

    pub async fn get<F, Fut, E>(&self, key: K, ttl: Duration, force_refresh: bool, loader: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: Display,
    {
        match self.try_get(key.clone(), ttl, force_refresh, loader).await {
            Ok(value) => value,
            Err(err) => {
                sync_warn!(
                    "cache",
                    "{}: load of {:?} failed ({}), nothing cached",
                    self.name,
                    key,
                    err
                );
                V::default()
            }
        }
    }

    /// Like [`TtlCache::get`], but a failed load with nothing stored is
    /// returned as the loader's error instead of `V::default()`. Caches
    /// derived from this one load through here so a failure upstream is never
    /// stored downstream as an empty value.
    pub async fn try_get<F, Fut, E>(
        &self,
        key: K,
        ttl: Duration,
        force_refresh: bool,
        loader: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: Display,
    {
        let epoch = {
            let slots = lock(&self.slots);
            if !force_refresh {
                if let Some(entry) = slots.entries.get(&key) {
                    if Instant::now() < entry.expires_at {
                        return Ok(entry.value.clone());
                    }
                }
            }
            slots.epoch
        };

        match loader().await {
            Ok(value) => {
                let mut slots = lock(&self.slots);
                if slots.epoch == epoch {
                    slots.entries.insert(
                        key,
                        CacheEntry {
                            value: value.clone(),
                            expires_at: Instant::now() + ttl,
                        },
                    );
                } else {
                    sync_debug!(
                        "cache",
                        "{}: dropping {:?} loaded before an invalidation",
                        self.name,
                        key
                    );
                }
                Ok(value)
            }
            Err(err) => {
                let slots = lock(&self.slots);
                match slots.entries.get(&key) {
                    Some(stale) => {
                        sync_warn!(
                            "cache",
                            "{}: load of {:?} failed ({}), serving stale value",
                            self.name,
                            key,
                            err
                        );
                        Ok(stale.value.clone())
                    }
                    None => Err(err),
                }
            }
        }
    }

    /// Live value for `key` without loading.
    pub fn peek(&self, key: &K) -> Option<V> {
        let slots = lock(&self.slots);
        slots
            .entries
            .get(key)
            .filter(|entry| Instant::now() < entry.expires_at)
            .map(|entry| entry.value.clone())
    }

    pub fn len(&self) -> usize {
        lock(&self.slots).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn invalidate(&self, key: &K) {
        {
            let mut slots = lock(&self.slots);
            slots.entries.remove(key);
            slots.epoch += 1;
        }
        self.cascade();
    }

    pub fn invalidate_all(&self) {
        {
            let mut slots = lock(&self.slots);
            slots.entries.clear();
            slots.epoch += 1;
        }
        self.cascade();
    }

    fn cascade(&self) {
        let dependents: Vec<Arc<dyn Invalidate>> = lock(&self.dependents).clone();
        for dependent in dependents {
            dependent.invalidate_all();
        }
    }
}

impl<K, V> Invalidate for TtlCache<K, V>
where
    K: Eq + Hash + Clone + Debug + Send,
    V: Clone + Default + Send,
{
    fn invalidate_all(&self) {
        TtlCache::invalidate_all(self);
    }
}
