//! Announcements feed
//!
//! The feed is a JSON array of `{id, title, body, timeInfo, priority}`
//! objects. Entries are shown in ascending priority order.

use std::sync::Arc;

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest};
use bridge_traits::time::{Clock, SystemClock};
use core_runtime::config::AnnouncementsConfig;
use core_sync::{CollectionSource, RemoteItem};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::error::{AnnouncementsError, Result};

pub const META_TIME_INFO: &str = "time_info";
pub const META_PRIORITY: &str = "priority";

/// One entry of the feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: String,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub time_info: String,
    #[serde(default)]
    pub priority: i64,
}

impl Announcement {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
        time_info: impl Into<String>,
        priority: i64,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            body: body.into(),
            time_info: time_info.into(),
            priority,
        }
    }

    pub fn into_item(self) -> RemoteItem {
        RemoteItem::new(self.id, self.title, self.body)
            .with_metadata(META_TIME_INFO, self.time_info)
            .with_metadata(META_PRIORITY, self.priority.to_string())
    }
}

/// Entries shown when the feed cannot be reached and nothing is cached.
pub fn default_announcements() -> Vec<Announcement> {
    vec![
        Announcement::new(
            "1",
            "Sunday School",
            "Join us at 11 AM every Sunday",
            "Sunday 11 AM",
            1,
        ),
        Announcement::new(
            "2",
            "Sunday Service",
            "Join us at 12PM every Sunday",
            "Sunday 12PM",
            2,
        ),
        Announcement::new(
            "3",
            "Bible Study",
            "Join us for Bible Study!",
            "Wednesday 6PM",
            3,
        ),
        Announcement::new(
            "4",
            "Good Friday Service",
            "Join our annual Good Friday Service",
            "April 18th",
            4,
        ),
    ]
}

/// Sort ascending by priority. Ties keep feed order.
pub fn order_by_priority(mut announcements: Vec<Announcement>) -> Vec<Announcement> {
    announcements.sort_by_key(|a| a.priority);
    announcements
}

pub struct AnnouncementsSource {
    http_client: Arc<dyn HttpClient>,
    clock: Arc<dyn Clock>,
    config: AnnouncementsConfig,
}

impl AnnouncementsSource {
    pub fn new(http_client: Arc<dyn HttpClient>, config: AnnouncementsConfig) -> Self {
        Self {
            http_client,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    /// Use a specific clock for the cache-buster parameter.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn request(&self) -> HttpRequest {
        let mut request = HttpRequest::get(self.config.feed_url.clone())
            .header("Accept", "application/json")
            .header("Cache-Control", "no-cache")
            .timeout(self.config.request_timeout);
        if self.config.cache_buster {
            request = request.query("cb", self.clock.unix_timestamp().to_string());
        }
        request
    }

    #[instrument(skip(self), fields(url = %self.config.feed_url))]
    pub async fn fetch_announcements(&self) -> Result<Vec<Announcement>> {
        let response = self.http_client.execute(self.request()).await?;

        if !response.is_success() {
            warn!(status = response.status, "Announcements feed request failed");
            return Err(AnnouncementsError::HttpStatus {
                status: response.status,
            });
        }

        let announcements: Vec<Announcement> = serde_json::from_slice(&response.body)
            .map_err(|e| AnnouncementsError::Decode(e.to_string()))?;
        debug!(count = announcements.len(), "Decoded announcements");

        Ok(order_by_priority(announcements))
    }
}

#[async_trait]
impl CollectionSource for AnnouncementsSource {
    fn name(&self) -> &str {
        "announcements"
    }

    async fn fetch(&self) -> core_sync::Result<Vec<RemoteItem>> {
        let announcements = self.fetch_announcements().await?;
        info!(count = announcements.len(), "Fetched announcements");
        Ok(announcements
            .into_iter()
            .map(Announcement::into_item)
            .collect())
    }

    fn fallback_items(&self) -> Vec<RemoteItem> {
        default_announcements()
            .into_iter()
            .map(Announcement::into_item)
            .collect()
    }
}
