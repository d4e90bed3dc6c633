use std::sync::Arc;

use reelsync_core::{paginate, MediaType, Page, PageKey, SubscriptionSnapshot};
use reelsync_logging::{sync_info, sync_warn};

use crate::cache::TtlCache;
use crate::collab::{
    LibraryInventory, LibraryStats, LibraryTrends, NewSubscription, SubscriptionManager,
};
use crate::settings::{CacheTtls, EngineSettings};
use crate::CollaboratorError;

/// Cached reads and write-through mutations of subscription data.
///
/// Cache layout: `subscriptions -> incomplete -> incomplete_pages`. Every
/// write that changes a subscription invalidates `subscriptions`, which
/// clears the derived list and every page keyed under any page size.
pub struct Catalog {
    manager: Arc<dyn SubscriptionManager>,
    library: Arc<dyn LibraryInventory>,
    ttls: CacheTtls,
    trend_days: u32,
    subscriptions: Arc<TtlCache<(), Vec<SubscriptionSnapshot>>>,
    incomplete: Arc<TtlCache<(), Vec<SubscriptionSnapshot>>>,
    incomplete_pages: Arc<TtlCache<PageKey, Page<SubscriptionSnapshot>>>,
    library_stats: TtlCache<(), LibraryStats>,
    trends: TtlCache<(), LibraryTrends>,
}

impl Catalog {
    pub fn new(
        manager: Arc<dyn SubscriptionManager>,
        library: Arc<dyn LibraryInventory>,
        settings: &EngineSettings,
    ) -> Self {
        let subscriptions = Arc::new(TtlCache::new("subscriptions"));
        let incomplete = Arc::new(TtlCache::new("incomplete"));
        let incomplete_pages = Arc::new(TtlCache::new("incomplete_pages"));
        subscriptions.cascade_to(incomplete.clone());
        incomplete.cascade_to(incomplete_pages.clone());

        Self {
            manager,
            library,
            ttls: settings.ttls,
            trend_days: settings.trend_days,
            subscriptions,
            incomplete,
            incomplete_pages,
            library_stats: TtlCache::new("library_stats"),
            trends: TtlCache::new("trends"),
        }
    }

    /// All subscriptions, newest first.
    pub async fn subscriptions(&self, force_refresh: bool) -> Vec<SubscriptionSnapshot> {
        self.subscriptions
            .get((), self.ttls.subscriptions, force_refresh, || {
                self.manager.fetch_subscription_list(force_refresh)
            })
            .await
    }

    async fn try_subscriptions(
        &self,
        force_refresh: bool,
    ) -> Result<Vec<SubscriptionSnapshot>, CollaboratorError> {
        self.subscriptions
            .try_get((), self.ttls.subscriptions, force_refresh, || {
                self.manager.fetch_subscription_list(force_refresh)
            })
            .await
    }

    /// Uncached authoritative read.
    pub async fn subscription(
        &self,
        id: &str,
    ) -> Result<Option<SubscriptionSnapshot>, CollaboratorError> {
        self.manager.fetch_subscription(id).await
    }

    /// Subscriptions still missing units, minus movies the library already has.
    pub async fn incomplete(&self, force_refresh: bool) -> Vec<SubscriptionSnapshot> {
        self.incomplete
            .get((), self.ttls.incomplete, force_refresh, || {
                self.load_incomplete(force_refresh)
            })
            .await
    }

    async fn try_incomplete(
        &self,
        force_refresh: bool,
    ) -> Result<Vec<SubscriptionSnapshot>, CollaboratorError> {
        self.incomplete
            .try_get((), self.ttls.incomplete, force_refresh, || {
                self.load_incomplete(force_refresh)
            })
            .await
    }

    async fn load_incomplete(
        &self,
        force_refresh: bool,
    ) -> Result<Vec<SubscriptionSnapshot>, CollaboratorError> {
        let all = self.try_subscriptions(force_refresh).await?;
        Ok(self.drop_present_movies(all).await)
    }

    pub async fn incomplete_page(
        &self,
        page: usize,
        page_size: usize,
        force_refresh: bool,
    ) -> Page<SubscriptionSnapshot> {
        let key = PageKey::new(page, page_size);
        self.incomplete_pages
            .get(key, self.ttls.incomplete_pages, force_refresh, || async move {
                let items = self.try_incomplete(force_refresh).await?;
                Ok::<_, CollaboratorError>(paginate(&items, key))
            })
            .await
    }

    pub async fn library_stats(&self, force_refresh: bool) -> LibraryStats {
        self.library_stats
            .get((), self.ttls.library_stats, force_refresh, || {
                self.library.library_stats()
            })
            .await
    }

    pub async fn trends(&self, force_refresh: bool) -> LibraryTrends {
        let days = self.trend_days;
        self.trends
            .get((), self.ttls.trends, force_refresh, || async move {
                let movies = self.library.daily_additions(MediaType::Movie, days).await?;
                let tv = self.library.daily_additions(MediaType::Tv, days).await?;
                Ok::<_, CollaboratorError>(LibraryTrends { movies, tv })
            })
            .await
    }

    pub async fn create_subscription(
        &self,
        data: &NewSubscription,
    ) -> Result<SubscriptionSnapshot, CollaboratorError> {
        let created = self.manager.create_subscription(data).await?;
        self.invalidate_subscriptions();
        sync_info!("catalog", "created subscription {} ({})", created.id, created.title);
        Ok(created)
    }

    pub async fn update_links(&self, id: &str, links: &[String]) -> Result<(), CollaboratorError> {
        self.manager.update_subscription_links(id, links).await?;
        self.invalidate_subscriptions();
        Ok(())
    }

    pub async fn trigger_execution(&self, id: &str) -> Result<(), CollaboratorError> {
        self.manager.trigger_execution(id).await
    }

    pub async fn delete_subscription(&self, id: &str) -> Result<(), CollaboratorError> {
        self.manager.delete_subscription(id).await?;
        self.invalidate_subscriptions();
        sync_info!("catalog", "deleted subscription {}", id);
        Ok(())
    }

    /// Drops the subscription list and everything derived from it.
    pub fn invalidate_subscriptions(&self) {
        self.subscriptions.invalidate_all();
    }

    /// Drops the incomplete list and all of its pages.
    pub fn invalidate_incomplete(&self) {
        self.incomplete.invalidate_all();
    }

    pub fn cached_page_count(&self) -> usize {
        self.incomplete_pages.len()
    }

    async fn drop_present_movies(
        &self,
        all: Vec<SubscriptionSnapshot>,
    ) -> Vec<SubscriptionSnapshot> {
        let incomplete: Vec<SubscriptionSnapshot> =
            all.into_iter().filter(|item| !item.is_complete()).collect();

        let movie_ids: Vec<String> = incomplete
            .iter()
            .filter(|item| item.media_type == MediaType::Movie)
            .map(|item| item.external_id.clone())
            .collect();
        if movie_ids.is_empty() {
            return incomplete;
        }

        match self
            .library
            .query_library_membership(&movie_ids, MediaType::Movie)
            .await
        {
            Ok(present) => incomplete
                .into_iter()
                .filter(|item| {
                    item.media_type != MediaType::Movie
                        || !present.get(&item.external_id).copied().unwrap_or(false)
                })
                .collect(),
            Err(err) => {
                sync_warn!("catalog", "library membership lookup failed: {}", err);
                incomplete
            }
        }
    }
}
