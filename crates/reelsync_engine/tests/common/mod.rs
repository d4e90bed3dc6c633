#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

use reelsync_core::{ExecutionStatus, MediaType, SubscriptionSnapshot};
use reelsync_engine::{
    CollaboratorError, LibraryInventory, LibraryStats, LinkDiscovery, NewSubscription,
    SubscriptionManager,
};
use tokio::sync::Notify;

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(reelsync_logging::initialize_for_tests);
}

pub fn movie(id: &str, title: &str) -> SubscriptionSnapshot {
    SubscriptionSnapshot {
        id: id.to_string(),
        external_id: format!("tmdb-{id}"),
        title: title.to_string(),
        media_type: MediaType::Movie,
        execution: ExecutionStatus::Pending,
        subscribed_units: 0,
        total_units: 1,
        links: Vec::new(),
    }
}

pub fn show(id: &str, title: &str, subscribed: u32, total: u32) -> SubscriptionSnapshot {
    SubscriptionSnapshot {
        id: id.to_string(),
        external_id: format!("tmdb-{id}"),
        title: title.to_string(),
        media_type: MediaType::Tv,
        execution: ExecutionStatus::Pending,
        subscribed_units: subscribed,
        total_units: total,
        links: Vec::new(),
    }
}

pub fn links(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|link| link.to_string()).collect()
}

/// In-memory subscription manager, newest subscription first.
#[derive(Default)]
pub struct FakeManager {
    subscriptions: Mutex<Vec<SubscriptionSnapshot>>,
    pub list_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
    pub update_calls: AtomicUsize,
    pub trigger_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    pub fail_list: AtomicBool,
    pub fail_fetch: AtomicBool,
    pub fail_update: AtomicBool,
    pub fail_trigger: AtomicBool,
    fetch_gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeManager {
    pub fn with(subscriptions: Vec<SubscriptionSnapshot>) -> Arc<Self> {
        Arc::new(Self {
            subscriptions: Mutex::new(subscriptions),
            ..Self::default()
        })
    }

    pub fn push_newest(&self, subscription: SubscriptionSnapshot) {
        self.subscriptions.lock().unwrap().insert(0, subscription);
    }

    pub fn remove(&self, id: &str) {
        self.subscriptions.lock().unwrap().retain(|item| item.id != id);
    }

    pub fn edit(&self, id: &str, change: impl FnOnce(&mut SubscriptionSnapshot)) {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        if let Some(item) = subscriptions.iter_mut().find(|item| item.id == id) {
            change(item);
        }
    }

    pub fn get(&self, id: &str) -> Option<SubscriptionSnapshot> {
        self.subscriptions
            .lock()
            .unwrap()
            .iter()
            .find(|item| item.id == id)
            .cloned()
    }

    /// The next `fetch_subscription` call blocks until the handle is notified.
    pub fn gate_next_fetch(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.fetch_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SubscriptionManager for FakeManager {
    async fn fetch_subscription_list(
        &self,
        _force_refresh: bool,
    ) -> Result<Vec<SubscriptionSnapshot>, CollaboratorError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(CollaboratorError::HttpStatus(503));
        }
        Ok(self.subscriptions.lock().unwrap().clone())
    }

    async fn fetch_subscription(
        &self,
        id: &str,
    ) -> Result<Option<SubscriptionSnapshot>, CollaboratorError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.fetch_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Network("connection reset".into()));
        }
        Ok(self.get(id))
    }

    async fn create_subscription(
        &self,
        data: &NewSubscription,
    ) -> Result<SubscriptionSnapshot, CollaboratorError> {
        let id = format!("{}", self.subscriptions.lock().unwrap().len() + 100);
        let created = SubscriptionSnapshot {
            id,
            external_id: data.external_id.clone(),
            title: data.title.clone(),
            media_type: data.media_type,
            execution: ExecutionStatus::Pending,
            subscribed_units: 0,
            total_units: 0,
            links: Vec::new(),
        };
        self.push_newest(created.clone());
        Ok(created)
    }

    async fn update_subscription_links(
        &self,
        id: &str,
        links: &[String],
    ) -> Result<(), CollaboratorError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(CollaboratorError::HttpStatus(500));
        }
        let mut subscriptions = self.subscriptions.lock().unwrap();
        let item = subscriptions
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| CollaboratorError::NotFound(id.to_string()))?;
        item.links = links.to_vec();
        Ok(())
    }

    async fn trigger_execution(&self, _id: &str) -> Result<(), CollaboratorError> {
        self.trigger_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_trigger.load(Ordering::SeqCst) {
            return Err(CollaboratorError::HttpStatus(502));
        }
        Ok(())
    }

    async fn delete_subscription(&self, id: &str) -> Result<(), CollaboratorError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.remove(id);
        Ok(())
    }
}

/// Library that holds a fixed set of external ids.
#[derive(Default)]
pub struct FakeLibrary {
    pub present: Mutex<HashSet<String>>,
    pub membership_calls: AtomicUsize,
}

impl FakeLibrary {
    pub fn holding(ids: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            present: Mutex::new(ids.iter().map(|id| id.to_string()).collect()),
            membership_calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait::async_trait]
impl LibraryInventory for FakeLibrary {
    async fn query_library_membership(
        &self,
        external_ids: &[String],
        _media_type: MediaType,
    ) -> Result<HashMap<String, bool>, CollaboratorError> {
        self.membership_calls.fetch_add(1, Ordering::SeqCst);
        let present = self.present.lock().unwrap();
        Ok(external_ids
            .iter()
            .map(|id| (id.clone(), present.contains(id)))
            .collect())
    }

    async fn library_stats(&self) -> Result<LibraryStats, CollaboratorError> {
        Ok(LibraryStats {
            movies: self.present.lock().unwrap().len() as u64,
            series: 0,
            episodes: 0,
        })
    }

    async fn daily_additions(
        &self,
        _media_type: MediaType,
        days: u32,
    ) -> Result<Vec<u64>, CollaboratorError> {
        Ok(vec![0; days as usize])
    }
}

/// Scripted link discovery keyed by external id.
#[derive(Default)]
pub struct FakeDiscovery {
    answers: Mutex<HashMap<String, Result<Vec<String>, CollaboratorError>>>,
    panics: Mutex<HashSet<String>>,
    gate: Mutex<Option<Arc<Notify>>>,
    pub calls: AtomicUsize,
}

impl FakeDiscovery {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn answer(&self, external_id: &str, answer: Result<Vec<String>, CollaboratorError>) {
        self.answers
            .lock()
            .unwrap()
            .insert(external_id.to_string(), answer);
    }

    pub fn panic_on(&self, external_id: &str) {
        self.panics.lock().unwrap().insert(external_id.to_string());
    }

    /// Every call blocks until the returned handle is notified.
    pub fn gate(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl LinkDiscovery for FakeDiscovery {
    async fn discover_links(
        &self,
        external_id: &str,
        _media_type: MediaType,
    ) -> Result<Vec<String>, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.panics.lock().unwrap().contains(external_id) {
            panic!("discovery blew up for {external_id}");
        }
        self.answers
            .lock()
            .unwrap()
            .get(external_id)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}
