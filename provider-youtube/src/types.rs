//! YouTube Data API v3 response types

use serde::Deserialize;

/// playlistItems.list response
///
/// See: https://developers.google.com/youtube/v3/docs/playlistItems/list
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemsResponse {
    #[serde(default)]
    pub items: Vec<PlaylistItem>,

    /// Token for next page
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistItem {
    pub snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub title: String,
    pub resource_id: ResourceId,
    pub thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceId {
    /// Absent for non-video playlist entries
    #[serde(default)]
    pub video_id: String,
}

#[derive(Debug, Deserialize)]
pub struct Thumbnails {
    pub default: Option<Thumbnail>,
    pub medium: Option<Thumbnail>,
    pub high: Option<Thumbnail>,
}

impl Thumbnails {
    /// The small default thumbnail, falling back to larger sizes.
    pub fn best_small(&self) -> Option<&str> {
        [&self.default, &self.medium, &self.high]
            .into_iter()
            .flatten()
            .map(|t| t.url.as_str())
            .find(|url| !url.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct Thumbnail {
    pub url: String,
}

/// videos.list response with `part=status`
///
/// See: https://developers.google.com/youtube/v3/docs/videos/list
#[derive(Debug, Deserialize)]
pub struct VideosResponse {
    #[serde(default)]
    pub items: Vec<VideoResource>,
}

#[derive(Debug, Deserialize)]
pub struct VideoResource {
    pub id: String,
    pub status: Option<VideoStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatus {
    pub upload_status: String,
    pub privacy_status: String,
    #[serde(default)]
    pub embeddable: bool,
}

impl VideoStatus {
    /// Why the video cannot be embedded, or `None` when it can.
    pub fn unplayable_reason(&self) -> Option<String> {
        if self.upload_status != "processed" {
            return Some(format!("upload status is {}", self.upload_status));
        }
        if !self.embeddable {
            return Some("embedding is disabled".to_string());
        }
        if self.privacy_status == "private" {
            return Some("video is private".to_string());
        }
        None
    }
}

/// Error payloads the API returns instead of data.
///
/// Two shapes are seen in practice: `{"error": {"code", "message"}}` and a
/// flat `{"message", "code"}`.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub error: Option<ApiErrorDetails>,
    pub message: Option<String>,
    pub code: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetails {
    pub code: Option<i64>,
    pub message: Option<String>,
}

impl ApiErrorBody {
    /// Detect an error payload in `body`. Returns `(code, message)`.
    pub fn detect(body: &[u8]) -> Option<(Option<i64>, String)> {
        let parsed: ApiErrorBody = serde_json::from_slice(body).ok()?;
        if parsed.error.is_none() && parsed.message.is_none() {
            return None;
        }
        let details = parsed.error.as_ref();
        let message = details
            .and_then(|e| e.message.clone())
            .or(parsed.message)
            .unwrap_or_else(|| "Unknown API error".to_string());
        let code = details.and_then(|e| e.code).or(parsed.code);
        Some((code, message))
    }
}
