//! # Core Configuration Module
//!
//! Configuration for the congregation app core.
//!
//! ## Overview
//!
//! A builder assembles a [`CoreConfig`] holding the host bridges plus the
//! tuning for each content feed. `build()` validates eagerly so that a
//! misconfigured host fails at startup rather than on the first refresh.
//!
//! ## Required Dependencies
//!
//! - `HttpClient` - all remote feeds (desktop default: reqwest)
//! - `SettingsStore` - preferences, notes and cache records (desktop default: SQLite)
//!
//! ## Optional Dependencies
//!
//! - `ContentSurface` - the embedded player; without it selection is
//!   bookkeeping only and surface probing is unavailable
//! - `Clock` - defaults to [`SystemClock`]
//!
//! When the `desktop-shims` feature is enabled, missing HTTP and settings
//! bridges fall back to the `bridge-desktop` adapters. The SQLite store is
//! opened asynchronously by the service bootstrap, so the config only
//! records where it should live.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{CoreConfig, YouTubeConfig};
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .youtube(YouTubeConfig::new("api-key", "PL1234"))
//!     .settings_store(Arc::new(MySettingsStore))
//!     .content_surface(Arc::new(MyPlayer))
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::{Clock, ContentSurface, HttpClient, SettingsStore, SystemClock};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Longest delay accepted for retries and probe timeouts.
const MAX_DELAY: Duration = Duration::from_secs(60);

pub const DEFAULT_PLAYLIST_ITEMS_ENDPOINT: &str =
    "https://www.googleapis.com/youtube/v3/playlistItems";
pub const DEFAULT_VIDEOS_ENDPOINT: &str = "https://www.googleapis.com/youtube/v3/videos";
pub const DEFAULT_WATCH_URL_BASE: &str = "https://www.youtube.com/watch?v=";
pub const DEFAULT_ANNOUNCEMENTS_URL: &str =
    "https://hudson1740.github.io/RiverRougeCOGOP-Apple/announcements.json";
pub const DEFAULT_BIBLE_BASE_URL: &str = "https://bible-api.com";

/// Core configuration for the congregation app core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    pub http_client: Arc<dyn HttpClient>,

    /// Injected settings store. `None` only when the desktop default will be
    /// opened at `settings_path` during bootstrap.
    pub settings_store: Option<Arc<dyn SettingsStore>>,

    /// Location for the desktop SQLite store when no store is injected.
    pub settings_path: Option<PathBuf>,

    pub content_surface: Option<Arc<dyn ContentSurface>>,

    pub clock: Arc<dyn Clock>,

    pub youtube: YouTubeConfig,
    pub announcements: AnnouncementsConfig,
    pub bible: BibleConfig,
    pub sync: SyncTuning,
    pub features: FeatureFlags,
}

impl fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreConfig")
            .field("http_client", &"HttpClient { ... }")
            .field(
                "settings_store",
                &self.settings_store.as_ref().map(|_| "SettingsStore { ... }"),
            )
            .field("settings_path", &self.settings_path)
            .field(
                "content_surface",
                &self.content_surface.as_ref().map(|_| "ContentSurface { ... }"),
            )
            .field("youtube", &self.youtube)
            .field("announcements", &self.announcements)
            .field("bible", &self.bible)
            .field("sync", &self.sync)
            .field("features", &self.features)
            .finish()
    }
}

/// Feature flags control which feeds the service wires up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    /// Fetch the worship playlist
    pub enable_playlist: bool,
    /// Probe playlist items for playability after fetching
    pub enable_playlist_probing: bool,
    pub enable_announcements: bool,
    pub enable_bible: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            enable_playlist: true,
            enable_playlist_probing: true,
            enable_announcements: true,
            enable_bible: true,
        }
    }
}

/// Playlist API settings.
///
/// The API key is never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct YouTubeConfig {
    pub api_key: String,
    pub playlist_id: String,
    pub playlist_items_endpoint: String,
    pub videos_endpoint: String,
    pub watch_url_base: String,
    /// Page size requested from the playlist endpoint (API maximum is 50)
    pub max_results: u32,
    /// Upper bound on pages followed through `nextPageToken`
    pub max_pages: u32,
}

impl YouTubeConfig {
    pub fn new(api_key: impl Into<String>, playlist_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            playlist_id: playlist_id.into(),
            ..Self::default()
        }
    }

    pub fn with_endpoints(
        mut self,
        playlist_items: impl Into<String>,
        videos: impl Into<String>,
    ) -> Self {
        self.playlist_items_endpoint = playlist_items.into();
        self.videos_endpoint = videos.into();
        self
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::Config(
                "YouTube API key is required when the playlist is enabled".to_string(),
            ));
        }
        if self.playlist_id.trim().is_empty() {
            return Err(Error::Config(
                "YouTube playlist id is required when the playlist is enabled".to_string(),
            ));
        }
        if self.max_results == 0 || self.max_results > 50 {
            return Err(Error::Config(
                "YouTube max_results must be between 1 and 50".to_string(),
            ));
        }
        if self.max_pages == 0 {
            return Err(Error::Config(
                "YouTube max_pages must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            playlist_id: String::new(),
            playlist_items_endpoint: DEFAULT_PLAYLIST_ITEMS_ENDPOINT.to_string(),
            videos_endpoint: DEFAULT_VIDEOS_ENDPOINT.to_string(),
            watch_url_base: DEFAULT_WATCH_URL_BASE.to_string(),
            max_results: 50,
            max_pages: 4,
        }
    }
}

impl fmt::Debug for YouTubeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("YouTubeConfig")
            .field("api_key", &"[REDACTED]")
            .field("playlist_id", &self.playlist_id)
            .field("playlist_items_endpoint", &self.playlist_items_endpoint)
            .field("videos_endpoint", &self.videos_endpoint)
            .field("max_results", &self.max_results)
            .field("max_pages", &self.max_pages)
            .finish()
    }
}

/// Announcements feed settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnouncementsConfig {
    pub feed_url: String,
    /// Append `cb=<unix seconds>` so intermediaries never serve a stale feed
    pub cache_buster: bool,
    pub request_timeout: Duration,
}

impl Default for AnnouncementsConfig {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_ANNOUNCEMENTS_URL.to_string(),
            cache_buster: true,
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Scripture lookup settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibleConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    /// Passage loaded before the user picks one, e.g. "John 3"
    pub initial_reference: String,
}

impl Default for BibleConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BIBLE_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(15),
            initial_reference: "John 3".to_string(),
        }
    }
}

/// When a successful refresh is followed by a probe pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeSchedule {
    /// Probe after every successful fetch.
    AfterEveryFetch,
    /// Probe only when the last completed pass is older than the duration,
    /// or when no pass has ever completed.
    WhenStale(Duration),
    /// Only explicit `validate_all` calls probe.
    Manual,
}

impl Default for ProbeSchedule {
    fn default() -> Self {
        ProbeSchedule::WhenStale(Duration::from_secs(24 * 60 * 60))
    }
}

/// Retry and probe tuning shared by every synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncTuning {
    /// Total fetch attempts including the first
    pub retry_attempts: u32,
    /// Fixed delay between fetch attempts
    pub retry_delay: Duration,
    /// Per-item probe timeout
    pub probe_timeout: Duration,
    /// Concurrent probes allowed for stateless probers. 1 means sequential.
    pub probe_concurrency: usize,
    pub probe_schedule: ProbeSchedule,
}

impl Default for SyncTuning {
    fn default() -> Self {
        Self {
            retry_attempts: 3,
            retry_delay: Duration::from_secs(5),
            probe_timeout: Duration::from_secs(3),
            probe_concurrency: 4,
            probe_schedule: ProbeSchedule::default(),
        }
    }
}

impl SyncTuning {
    pub fn validate(&self) -> Result<()> {
        if self.retry_attempts == 0 {
            return Err(Error::Config(
                "Retry attempts must be at least 1".to_string(),
            ));
        }
        if self.retry_delay > MAX_DELAY {
            return Err(Error::Config(
                "Retry delay exceeds maximum of 60 seconds".to_string(),
            ));
        }
        if self.probe_timeout.is_zero() {
            return Err(Error::Config(
                "Probe timeout must be greater than zero".to_string(),
            ));
        }
        if self.probe_timeout > MAX_DELAY {
            return Err(Error::Config(
                "Probe timeout exceeds maximum of 60 seconds".to_string(),
            ));
        }
        if self.probe_concurrency == 0 {
            return Err(Error::Config(
                "Probe concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates feed settings against the enabled features.
    pub fn validate(&self) -> Result<()> {
        self.sync.validate()?;

        if self.features.enable_playlist {
            self.youtube.validate()?;
        }

        if self.features.enable_announcements && self.announcements.feed_url.trim().is_empty() {
            return Err(Error::Config(
                "Announcements feed URL cannot be empty".to_string(),
            ));
        }

        if self.features.enable_bible && self.bible.base_url.trim().is_empty() {
            return Err(Error::Config("Bible base URL cannot be empty".to_string()));
        }

        if self.settings_store.is_none() && self.settings_path.is_none() {
            return Err(settings_store_missing_error());
        }

        Ok(())
    }
}

fn settings_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "SettingsStore".to_string(),
        message: "SettingsStore implementation is required for preferences, notes and cache records. \
                 Desktop: enable the 'desktop-shims' feature to use the default SqliteSettingsStore. \
                 Mobile: inject platform-native settings (UserDefaults/DataStore)."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new());
    Ok(client)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    Err(Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "No HTTP client implementation provided. \
                 Desktop: enable the 'desktop-shims' feature. \
                 Mobile: inject a platform-native adapter."
            .to_string(),
    })
}

#[cfg(feature = "desktop-shims")]
fn provide_default_settings_path() -> Option<PathBuf> {
    bridge_desktop::SqliteSettingsStore::default_path().ok()
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_settings_path() -> Option<PathBuf> {
    None
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    http_client: Option<Arc<dyn HttpClient>>,
    settings_store: Option<Arc<dyn SettingsStore>>,
    settings_path: Option<PathBuf>,
    content_surface: Option<Arc<dyn ContentSurface>>,
    clock: Option<Arc<dyn Clock>>,
    youtube: Option<YouTubeConfig>,
    announcements: Option<AnnouncementsConfig>,
    bible: Option<BibleConfig>,
    sync: Option<SyncTuning>,
    features: FeatureFlags,
}

impl CoreConfigBuilder {
    /// Sets the HTTP client implementation.
    ///
    /// If not provided, the reqwest-based client is used when the
    /// `desktop-shims` feature is enabled.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the settings store implementation.
    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    /// Overrides where the desktop settings database is created.
    ///
    /// Ignored when a store is injected with [`settings_store`](Self::settings_store).
    pub fn settings_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.settings_path = Some(path.into());
        self
    }

    /// Sets the host content surface (embedded player).
    pub fn content_surface(mut self, surface: Arc<dyn ContentSurface>) -> Self {
        self.content_surface = Some(surface);
        self
    }

    /// Sets the clock. Defaults to [`SystemClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn youtube(mut self, config: YouTubeConfig) -> Self {
        self.youtube = Some(config);
        self
    }

    pub fn announcements(mut self, config: AnnouncementsConfig) -> Self {
        self.announcements = Some(config);
        self
    }

    pub fn bible(mut self, config: BibleConfig) -> Self {
        self.bible = Some(config);
        self
    }

    pub fn sync_tuning(mut self, tuning: SyncTuning) -> Self {
        self.sync = Some(tuning);
        self
    }

    /// Enables or disables the worship playlist feed.
    ///
    /// Default: true
    pub fn enable_playlist(mut self, enabled: bool) -> Self {
        self.features.enable_playlist = enabled;
        self
    }

    /// Enables or disables playability probing of playlist items.
    ///
    /// Default: true
    pub fn enable_playlist_probing(mut self, enabled: bool) -> Self {
        self.features.enable_playlist_probing = enabled;
        self
    }

    /// Default: true
    pub fn enable_announcements(mut self, enabled: bool) -> Self {
        self.features.enable_announcements = enabled;
        self
    }

    /// Default: true
    pub fn enable_bible(mut self, enabled: bool) -> Self {
        self.features.enable_bible = enabled;
        self
    }

    /// Builds the final configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::CapabilityMissing`] when a required bridge is absent and no
    ///   desktop default is compiled in
    /// - [`Error::Config`] when feed settings or tuning are invalid
    pub fn build(self) -> Result<CoreConfig> {
        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client()?,
        };

        let settings_path = match (&self.settings_store, self.settings_path) {
            (Some(_), _) => None,
            (None, Some(path)) => Some(path),
            (None, None) => provide_default_settings_path(),
        };

        let config = CoreConfig {
            http_client,
            settings_store: self.settings_store,
            settings_path,
            content_surface: self.content_surface,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            youtube: self.youtube.unwrap_or_default(),
            announcements: self.announcements.unwrap_or_default(),
            bible: self.bible.unwrap_or_default(),
            sync: self.sync.unwrap_or_default(),
            features: self.features,
        };

        config.validate()?;
        Ok(config)
    }
}
