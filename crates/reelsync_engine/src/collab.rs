//! Contracts of the external collaborators the engine drives.
//!
//! Implementations are [`crate::RestSubscriptionManager`],
//! [`crate::EmbyLibrary`] and [`crate::BridgeLinkDiscovery`]; the
//! `Unconfigured*` types stand in when a collaborator is absent from the
//! configuration and answer with empty results.
use std::collections::HashMap;

use reelsync_core::{MediaType, SubscriptionSnapshot};

use crate::CollaboratorError;

/// Request to create a subscription downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubscription {
    pub external_id: String,
    pub title: String,
    pub media_type: MediaType,
    pub year: Option<String>,
}

#[async_trait::async_trait]
pub trait SubscriptionManager: Send + Sync {
    /// All subscriptions, newest first.
    async fn fetch_subscription_list(
        &self,
        force_refresh: bool,
    ) -> Result<Vec<SubscriptionSnapshot>, CollaboratorError>;

    /// The authoritative record for one subscription, `None` once deleted.
    async fn fetch_subscription(
        &self,
        id: &str,
    ) -> Result<Option<SubscriptionSnapshot>, CollaboratorError> {
        let list = self.fetch_subscription_list(true).await?;
        Ok(list.into_iter().find(|item| item.id == id))
    }

    async fn create_subscription(
        &self,
        data: &NewSubscription,
    ) -> Result<SubscriptionSnapshot, CollaboratorError>;

    /// Replaces the subscription's link list with `links`.
    async fn update_subscription_links(
        &self,
        id: &str,
        links: &[String],
    ) -> Result<(), CollaboratorError>;

    /// Asks the manager to act on the subscription's current links.
    async fn trigger_execution(&self, id: &str) -> Result<(), CollaboratorError>;

    async fn delete_subscription(&self, id: &str) -> Result<(), CollaboratorError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LibraryStats {
    pub movies: u64,
    pub series: u64,
    pub episodes: u64,
}

impl LibraryStats {
    pub fn total(&self) -> u64 {
        self.movies + self.series
    }
}

/// Items added to the library per day, oldest day first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LibraryTrends {
    pub movies: Vec<u64>,
    pub tv: Vec<u64>,
}

#[async_trait::async_trait]
pub trait LibraryInventory: Send + Sync {
    /// Which of `external_ids` are present in the library. Batched: one call
    /// per media type regardless of the number of ids.
    async fn query_library_membership(
        &self,
        external_ids: &[String],
        media_type: MediaType,
    ) -> Result<HashMap<String, bool>, CollaboratorError>;

    async fn library_stats(&self) -> Result<LibraryStats, CollaboratorError>;

    /// Per-day addition counts for the last `days` days, today included.
    async fn daily_additions(
        &self,
        media_type: MediaType,
        days: u32,
    ) -> Result<Vec<u64>, CollaboratorError>;
}

#[async_trait::async_trait]
pub trait LinkDiscovery: Send + Sync {
    /// Share links found for a title. Slow: tens of seconds is normal.
    async fn discover_links(
        &self,
        external_id: &str,
        media_type: MediaType,
    ) -> Result<Vec<String>, CollaboratorError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredLibrary;

#[async_trait::async_trait]
impl LibraryInventory for UnconfiguredLibrary {
    async fn query_library_membership(
        &self,
        _external_ids: &[String],
        _media_type: MediaType,
    ) -> Result<HashMap<String, bool>, CollaboratorError> {
        Ok(HashMap::new())
    }

    async fn library_stats(&self) -> Result<LibraryStats, CollaboratorError> {
        Ok(LibraryStats::default())
    }

    async fn daily_additions(
        &self,
        _media_type: MediaType,
        _days: u32,
    ) -> Result<Vec<u64>, CollaboratorError> {
        Ok(Vec::new())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredDiscovery;

#[async_trait::async_trait]
impl LinkDiscovery for UnconfiguredDiscovery {
    async fn discover_links(
        &self,
        _external_id: &str,
        _media_type: MediaType,
    ) -> Result<Vec<String>, CollaboratorError> {
        Ok(Vec::new())
    }
}
