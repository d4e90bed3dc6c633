//! JSON-over-HTTP subscription manager.
use std::time::Duration;

use reelsync_core::{ExecutionStatus, MediaType, SubscriptionSnapshot};
use reelsync_logging::sync_debug;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::collab::{NewSubscription, SubscriptionManager};
use crate::CollaboratorError;

#[derive(Debug, Clone)]
pub struct RestSettings {
    pub base_url: String,
    pub token: Option<String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl RestSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubscriptionRecord {
    id: String,
    #[serde(default)]
    external_id: String,
    #[serde(default)]
    title: String,
    media_type: String,
    #[serde(default)]
    execution: Option<String>,
    #[serde(default)]
    subscribed_units: u32,
    #[serde(default)]
    total_units: u32,
    #[serde(default)]
    links: Vec<String>,
}

impl SubscriptionRecord {
    fn into_snapshot(self) -> Result<SubscriptionSnapshot, CollaboratorError> {
        let media_type = MediaType::parse(&self.media_type).ok_or_else(|| {
            CollaboratorError::Decode(format!("unknown media type {:?}", self.media_type))
        })?;
        let execution = self
            .execution
            .as_deref()
            .and_then(ExecutionStatus::parse)
            .unwrap_or_default();
        Ok(SubscriptionSnapshot {
            id: self.id,
            external_id: self.external_id,
            title: self.title,
            media_type,
            execution,
            subscribed_units: self.subscribed_units,
            total_units: self.total_units,
            links: self.links,
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateBody<'a> {
    external_id: &'a str,
    title: &'a str,
    media_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    year: Option<&'a str>,
}

#[derive(Serialize)]
struct LinksBody<'a> {
    links: &'a [String],
}

/// Talks to a subscription manager exposing `/subscriptions` resources.
#[derive(Debug, Clone)]
pub struct RestSubscriptionManager {
    client: reqwest::Client,
    base: Url,
    token: Option<String>,
    request_timeout: Duration,
}

impl RestSubscriptionManager {
    pub fn new(settings: RestSettings) -> Result<Self, CollaboratorError> {
        let base = Url::parse(&settings.base_url)
            .map_err(|err| CollaboratorError::InvalidUrl(err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(CollaboratorError::InvalidUrl(settings.base_url));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| CollaboratorError::Network(err.to_string()))?;
        Ok(Self {
            client,
            base,
            token: settings.token,
            request_timeout: settings.request_timeout,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, CollaboratorError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| CollaboratorError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<String>,
    ) -> Result<reqwest::Response, CollaboratorError> {
        sync_debug!("rest", "{} {}", method, url);
        let mut request = self.client.request(method, url);
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(body) = body {
            request = request.header(CONTENT_TYPE, "application/json").body(body);
        }
        request.send().await.map_err(|err| self.transport_error(err))
    }

    async fn expect_success(&self, response: reqwest::Response) -> Result<String, CollaboratorError> {
        let status = response.status();
        if !status.is_success() {
            return Err(CollaboratorError::HttpStatus(status.as_u16()));
        }
        response.text().await.map_err(|err| self.transport_error(err))
    }

    fn transport_error(&self, err: reqwest::Error) -> CollaboratorError {
        CollaboratorError::from_transport(err, self.request_timeout)
    }
}

#[async_trait::async_trait]
impl SubscriptionManager for RestSubscriptionManager {
    async fn fetch_subscription_list(
        &self,
        _force_refresh: bool,
    ) -> Result<Vec<SubscriptionSnapshot>, CollaboratorError> {
        let url = self.endpoint(&["subscriptions"])?;
        let body = self.expect_success(self.send(Method::GET, url, None).await?).await?;
        let records: Vec<SubscriptionRecord> = serde_json::from_str(&body)?;
        records
            .into_iter()
            .map(SubscriptionRecord::into_snapshot)
            .collect()
    }

    async fn fetch_subscription(
        &self,
        id: &str,
    ) -> Result<Option<SubscriptionSnapshot>, CollaboratorError> {
        let url = self.endpoint(&["subscriptions", id])?;
        let response = self.send(Method::GET, url, None).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = self.expect_success(response).await?;
        let record: SubscriptionRecord = serde_json::from_str(&body)?;
        record.into_snapshot().map(Some)
    }

    async fn create_subscription(
        &self,
        data: &NewSubscription,
    ) -> Result<SubscriptionSnapshot, CollaboratorError> {
        let url = self.endpoint(&["subscriptions"])?;
        let body = serde_json::to_string(&CreateBody {
            external_id: &data.external_id,
            title: &data.title,
            media_type: data.media_type.as_str(),
            year: data.year.as_deref(),
        })?;
        let body = self.expect_success(self.send(Method::POST, url, Some(body)).await?).await?;
        let record: SubscriptionRecord = serde_json::from_str(&body)?;
        record.into_snapshot()
    }

    async fn update_subscription_links(
        &self,
        id: &str,
        links: &[String],
    ) -> Result<(), CollaboratorError> {
        let url = self.endpoint(&["subscriptions", id, "links"])?;
        let body = serde_json::to_string(&LinksBody { links })?;
        let response = self.send(Method::PUT, url, Some(body)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(CollaboratorError::NotFound(id.to_string()));
        }
        self.expect_success(response).await.map(drop)
    }

    async fn trigger_execution(&self, id: &str) -> Result<(), CollaboratorError> {
        let url = self.endpoint(&["subscriptions", id, "execute"])?;
        let response = self.send(Method::POST, url, None).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(CollaboratorError::NotFound(id.to_string()));
        }
        self.expect_success(response).await.map(drop)
    }

    async fn delete_subscription(&self, id: &str) -> Result<(), CollaboratorError> {
        let url = self.endpoint(&["subscriptions", id])?;
        let response = self.send(Method::DELETE, url, None).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(CollaboratorError::NotFound(id.to_string()));
        }
        self.expect_success(response).await.map(drop)
    }
}
