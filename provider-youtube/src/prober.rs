//! Stateless video status prober
//!
//! Checks each video through the `videos` endpoint instead of cueing it in
//! the embedded player, so probes can run concurrently.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest};
use core_runtime::config::YouTubeConfig;
use core_sync::{ItemProber, ProbeOutcome, RemoteItem};
use tracing::debug;

use crate::error::Result;
use crate::playlist::decode_response;
use crate::types::VideosResponse;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Probes videos with `videos.list?part=status`.
///
/// A video is playable when its upload is processed, embedding is allowed
/// and it is not private.
pub struct YouTubeStatusProber {
    http_client: Arc<dyn HttpClient>,
    config: YouTubeConfig,
}

impl YouTubeStatusProber {
    pub fn new(http_client: Arc<dyn HttpClient>, config: YouTubeConfig) -> Self {
        Self {
            http_client,
            config,
        }
    }

    async fn check(&self, video_id: &str) -> Result<ProbeOutcome> {
        let request = HttpRequest::get(self.config.videos_endpoint.clone())
            .query("part", "status")
            .query("id", video_id)
            .query("key", self.config.api_key.clone())
            .timeout(REQUEST_TIMEOUT);

        let response = self.http_client.execute(request).await?;
        let decoded: VideosResponse = decode_response(&response)?;

        let Some(video) = decoded.items.into_iter().find(|v| v.id == video_id) else {
            return Ok(ProbeOutcome::invalid("video not found"));
        };
        let Some(status) = video.status else {
            return Ok(ProbeOutcome::invalid("video status missing"));
        };

        Ok(match status.unplayable_reason() {
            Some(reason) => ProbeOutcome::invalid(reason),
            None => ProbeOutcome::Valid,
        })
    }
}

#[async_trait]
impl ItemProber for YouTubeStatusProber {
    async fn probe(&self, item: &RemoteItem) -> ProbeOutcome {
        match self.check(&item.payload).await {
            Ok(outcome) => outcome,
            Err(e) => {
                debug!(item_id = %item.id, error = %e, "Status probe failed");
                ProbeOutcome::invalid(e.to_string())
            }
        }
    }

    fn shares_channel(&self) -> bool {
        false
    }
}
