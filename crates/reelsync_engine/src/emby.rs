//! Media library adapter for Emby-compatible servers.
use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Days, SecondsFormat, Utc};
use reelsync_core::MediaType;
use reelsync_logging::sync_debug;
use reqwest::Url;
use serde::Deserialize;

use crate::collab::{LibraryInventory, LibraryStats};
use crate::CollaboratorError;

#[derive(Debug, Clone)]
pub struct EmbySettings {
    pub base_url: String,
    pub api_key: String,
    pub request_timeout: Duration,
}

impl EmbySettings {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            request_timeout: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ItemsResponse {
    #[serde(default)]
    items: Vec<ItemRecord>,
    #[serde(default)]
    total_record_count: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ItemRecord {
    #[serde(default)]
    provider_ids: HashMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CountsResponse {
    #[serde(default)]
    movie_count: u64,
    #[serde(default)]
    series_count: u64,
    #[serde(default)]
    episode_count: u64,
}

fn item_type(media_type: MediaType) -> &'static str {
    match media_type {
        MediaType::Movie => "Movie",
        MediaType::Tv => "Series",
    }
}

fn tmdb_id(item: &ItemRecord) -> Option<&str> {
    item.provider_ids
        .iter()
        .find(|(provider, _)| provider.eq_ignore_ascii_case("tmdb"))
        .map(|(_, id)| id.as_str())
}

fn iso(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub struct EmbyLibrary {
    client: reqwest::Client,
    base: Url,
    api_key: String,
    request_timeout: Duration,
}

impl EmbyLibrary {
    pub fn new(settings: EmbySettings) -> Result<Self, CollaboratorError> {
        let base = Url::parse(&settings.base_url)
            .map_err(|err| CollaboratorError::InvalidUrl(err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(CollaboratorError::InvalidUrl(settings.base_url));
        }
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| CollaboratorError::Network(err.to_string()))?;
        Ok(Self {
            client,
            base,
            api_key: settings.api_key,
            request_timeout: settings.request_timeout,
        })
    }

    fn endpoint(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url, CollaboratorError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| CollaboratorError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("api_key", &self.api_key);
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn get_json<T>(&self, url: Url) -> Result<T, CollaboratorError>
    where
        T: for<'de> Deserialize<'de>,
    {
        sync_debug!("emby", "GET {}", url.path());
        let limit = self.request_timeout;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| CollaboratorError::from_transport(err, limit))?;
        let status = response.status();
        if !status.is_success() {
            return Err(CollaboratorError::HttpStatus(status.as_u16()));
        }
        let body = response
            .text()
            .await
            .map_err(|err| CollaboratorError::from_transport(err, limit))?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait::async_trait]
impl LibraryInventory for EmbyLibrary {
    async fn query_library_membership(
        &self,
        external_ids: &[String],
        media_type: MediaType,
    ) -> Result<HashMap<String, bool>, CollaboratorError> {
        let mut membership: HashMap<String, bool> = external_ids
            .iter()
            .map(|id| (id.clone(), false))
            .collect();
        if external_ids.is_empty() {
            return Ok(membership);
        }

        let any_of = external_ids
            .iter()
            .map(|id| format!("tmdb.{id}"))
            .collect::<Vec<_>>()
            .join(",");
        let url = self.endpoint(
            &["Items"],
            &[
                ("AnyProviderIdEquals", any_of.as_str()),
                ("IncludeItemTypes", item_type(media_type)),
                ("Recursive", "true"),
                ("Fields", "ProviderIds"),
            ],
        )?;
        let found: ItemsResponse = self.get_json(url).await?;
        for item in &found.items {
            if let Some(present) = tmdb_id(item).and_then(|id| membership.get_mut(id)) {
                *present = true;
            }
        }
        Ok(membership)
    }

    async fn library_stats(&self) -> Result<LibraryStats, CollaboratorError> {
        let url = self.endpoint(&["Items", "Counts"], &[])?;
        let counts: CountsResponse = self.get_json(url).await?;
        Ok(LibraryStats {
            movies: counts.movie_count,
            series: counts.series_count,
            episodes: counts.episode_count,
        })
    }

    async fn daily_additions(
        &self,
        media_type: MediaType,
        days: u32,
    ) -> Result<Vec<u64>, CollaboratorError> {
        let today = Utc::now()
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|midnight| midnight.and_utc())
            .ok_or_else(|| CollaboratorError::Decode("invalid calendar date".into()))?;

        let mut counts = Vec::with_capacity(days as usize);
        for back in (0..u64::from(days)).rev() {
            let start = today
                .checked_sub_days(Days::new(back))
                .ok_or_else(|| CollaboratorError::Decode("date out of range".into()))?;
            let end = start
                .checked_add_days(Days::new(1))
                .ok_or_else(|| CollaboratorError::Decode("date out of range".into()))?;
            let (min, max) = (iso(start), iso(end));
            let url = self.endpoint(
                &["Items"],
                &[
                    ("IncludeItemTypes", item_type(media_type)),
                    ("Recursive", "true"),
                    ("Fields", "DateCreated"),
                    ("MinDateCreated", min.as_str()),
                    ("MaxDateCreated", max.as_str()),
                    ("Limit", "0"),
                ],
            )?;
            let day: ItemsResponse = self.get_json(url).await?;
            counts.push(day.total_record_count);
        }
        Ok(counts)
    }
}
