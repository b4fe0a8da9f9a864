//! Playlist collection source
//!
//! Reads a playlist through the YouTube Data API v3 `playlistItems`
//! endpoint, following `nextPageToken` up to the configured page limit.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use core_runtime::config::YouTubeConfig;
use core_runtime::logging::redact_url;
use core_sync::{CollectionSource, RemoteItem};
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, YouTubeError};
use crate::types::{ApiErrorBody, PlaylistItem, PlaylistItemsResponse};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Watch page URL for a video id.
pub fn watch_url(base: &str, video_id: &str) -> String {
    format!("{}{}", base, urlencoding::encode(video_id))
}

/// Check status and error payloads, then decode `body` as `T`.
pub(crate) fn decode_response<T>(response: &HttpResponse) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    if response.status != 200 {
        warn!(status = response.status, "YouTube API request failed");
        return Err(YouTubeError::HttpStatus {
            status: response.status,
        });
    }

    if let Some((code, message)) = ApiErrorBody::detect(&response.body) {
        warn!(?code, message = %message, "YouTube API returned an error payload");
        return Err(YouTubeError::Api { code, message });
    }

    serde_json::from_slice(&response.body).map_err(|e| YouTubeError::ParseError(e.to_string()))
}

/// YouTube playlist source
///
/// # Example
///
/// ```ignore
/// let source = YouTubePlaylistSource::new(http_client, YouTubeConfig::new(key, playlist));
/// let sync = RemoteListSynchronizer::builder(Arc::new(source)).build();
/// ```
pub struct YouTubePlaylistSource {
    http_client: Arc<dyn HttpClient>,
    config: YouTubeConfig,
}

impl YouTubePlaylistSource {
    pub fn new(http_client: Arc<dyn HttpClient>, config: YouTubeConfig) -> Self {
        Self {
            http_client,
            config,
        }
    }

    fn page_request(&self, page_token: Option<&str>) -> HttpRequest {
        let mut request = HttpRequest::get(self.config.playlist_items_endpoint.clone())
            .query("part", "snippet")
            .query("playlistId", self.config.playlist_id.clone())
            .query("key", self.config.api_key.clone())
            .query("maxResults", self.config.max_results.to_string())
            .header("Accept", "application/json")
            .timeout(REQUEST_TIMEOUT);
        if let Some(token) = page_token {
            request = request.query("pageToken", token);
        }
        request
    }

    /// Convert a playlist entry. Entries without a video id are skipped.
    fn convert_item(item: PlaylistItem) -> Option<RemoteItem> {
        let snippet = item.snippet;
        let video_id = snippet.resource_id.video_id;
        if video_id.is_empty() {
            return None;
        }

        let mut remote = RemoteItem::new(video_id.clone(), snippet.title, video_id);
        if let Some(url) = snippet.thumbnails.as_ref().and_then(|t| t.best_small()) {
            remote = remote.with_thumbnail(url);
        }
        Some(remote)
    }

    /// Fetch every page of the playlist.
    #[instrument(skip(self), fields(playlist_id = %self.config.playlist_id))]
    pub async fn fetch_items(&self) -> Result<Vec<RemoteItem>> {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;

        for page in 1..=self.config.max_pages {
            let request = self.page_request(page_token.as_deref());
            debug!(page, url = %redact_url(&request.url), "Requesting playlist page");

            let response = self.http_client.execute(request).await?;
            let decoded: PlaylistItemsResponse = decode_response(&response)?;

            items.extend(decoded.items.into_iter().filter_map(Self::convert_item));

            match decoded.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
            if page == self.config.max_pages {
                debug!(max_pages = self.config.max_pages, "Stopping at page limit");
            }
        }

        info!(count = items.len(), "Fetched playlist items");
        Ok(items)
    }
}

#[async_trait]
impl CollectionSource for YouTubePlaylistSource {
    fn name(&self) -> &str {
        "worship"
    }

    async fn fetch(&self) -> core_sync::Result<Vec<RemoteItem>> {
        Ok(self.fetch_items().await?)
    }

    fn external_url(&self, item: &RemoteItem) -> Option<String> {
        Some(watch_url(&self.config.watch_url_base, &item.payload))
    }
}
