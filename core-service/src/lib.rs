//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridges (HTTP, settings, content surface,
//! clock) into the shared core: one synchronizer per remote feed, the local
//! record stores and the event bus they all report to. Desktop hosts
//! typically enable the `desktop-shims` feature so that missing bridges fall
//! back to the implementations in `bridge-desktop`.
//!
//! ```ignore
//! let config = CoreConfig::builder()
//!     .youtube(YouTubeConfig::new(api_key, playlist_id))
//!     .content_surface(player)
//!     .build()?;
//! let core = CoreService::bootstrap(config).await?;
//! core.start().await;
//! ```

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use bridge_traits::SettingsStore;
use core_library::{NotesRepository, PreferencesStore, VerseMarks};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventBus, Receiver};
use core_sync::{
    CacheRepository, FetchOutcome, RefreshOutcome, RemoteListSynchronizer, SharedSurface, StaticFilter,
    SyncError,
};
use provider_announcements::AnnouncementsSource;
use provider_bible::{BibleClient, PassageSource, Reference};
use provider_youtube::{YouTubePlaylistSource, YouTubeStatusProber};
use tracing::{debug, info, instrument, warn};

const EVENT_CAPACITY: usize = 256;

pub const PLAYLIST_NAMESPACE: &str = "worship";
pub const ANNOUNCEMENTS_NAMESPACE: &str = "announcements";

/// What happened during [`CoreService::start`].
#[derive(Debug, Default)]
pub struct StartReport {
    /// Items restored from cache across all feeds
    pub restored: usize,
    /// Feeds that refreshed successfully
    pub refreshed: Vec<String>,
    /// Feeds whose refresh failed, with the error that is now in their state
    pub failed: Vec<(String, SyncError)>,
}

struct Inner {
    events: EventBus,
    settings: Arc<dyn SettingsStore>,
    playlist: Option<Arc<RemoteListSynchronizer>>,
    announcements: Option<Arc<RemoteListSynchronizer>>,
    bible: Option<Arc<RemoteListSynchronizer>>,
    passage: Option<Arc<PassageSource>>,
    preferences: PreferencesStore,
    notes: NotesRepository,
    verse_marks: VerseMarks,
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    inner: Arc<Inner>,
}

impl CoreService {
    /// Resolve bridges and build every enabled component.
    ///
    /// Nothing is fetched here; call [`CoreService::start`] afterwards.
    #[instrument(skip(config))]
    pub async fn bootstrap(config: CoreConfig) -> Result<Self> {
        let settings = resolve_settings_store(&config).await?;
        let events = EventBus::new(EVENT_CAPACITY);
        let surface = config.content_surface.clone().map(SharedSurface::new);
        let features = config.features;

        let playlist = if features.enable_playlist {
            let source = YouTubePlaylistSource::new(config.http_client.clone(), config.youtube.clone());
            let mut builder = RemoteListSynchronizer::builder(Arc::new(source))
                .filter(StaticFilter::default())
                .cache(CacheRepository::new(settings.clone(), PLAYLIST_NAMESPACE))
                .clock(config.clock.clone())
                .events(events.clone())
                .tuning(config.sync);
            if features.enable_playlist_probing {
                builder = builder.prober(Arc::new(YouTubeStatusProber::new(
                    config.http_client.clone(),
                    config.youtube.clone(),
                )));
            }
            if let Some(surface) = &surface {
                builder = builder.surface(surface.clone());
            }
            Some(Arc::new(builder.build()))
        } else {
            None
        };

        let announcements = features.enable_announcements.then(|| {
            let source =
                AnnouncementsSource::new(config.http_client.clone(), config.announcements.clone())
                    .with_clock(config.clock.clone());
            Arc::new(
                RemoteListSynchronizer::builder(Arc::new(source))
                    .filter(StaticFilter::permissive())
                    .cache(CacheRepository::new(settings.clone(), ANNOUNCEMENTS_NAMESPACE))
                    .clock(config.clock.clone())
                    .events(events.clone())
                    .tuning(config.sync)
                    .build(),
            )
        });

        let (bible, passage) = if features.enable_bible {
            let initial = Reference::parse(&config.bible.initial_reference)?;
            let client = Arc::new(BibleClient::new(
                config.http_client.clone(),
                config.bible.clone(),
            ));
            let passage = Arc::new(PassageSource::new(client, initial));
            let sync = RemoteListSynchronizer::builder(passage.clone())
                .filter(StaticFilter::permissive())
                .clock(config.clock.clone())
                .events(events.clone())
                .tuning(config.sync)
                .build();
            (Some(Arc::new(sync)), Some(passage))
        } else {
            (None, None)
        };

        let preferences = PreferencesStore::new(settings.clone()).with_events(events.clone());
        let notes = NotesRepository::load_with(
            settings.clone(),
            config.clock.clone(),
            Some(events.clone()),
        )
        .await?;
        let verse_marks = VerseMarks::load(settings.clone(), Some(events.clone())).await?;

        info!(
            playlist = playlist.is_some(),
            announcements = announcements.is_some(),
            bible = bible.is_some(),
            surface = surface.is_some(),
            "Core service bootstrapped"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                events,
                settings,
                playlist,
                announcements,
                bible,
                passage,
                preferences,
                notes,
                verse_marks,
            }),
        })
    }

    fn feeds(&self) -> impl Iterator<Item = &Arc<RemoteListSynchronizer>> {
        [
            self.inner.playlist.as_ref(),
            self.inner.announcements.as_ref(),
            self.inner.bible.as_ref(),
        ]
        .into_iter()
        .flatten()
    }

    /// Restore cached lists, then refresh every enabled feed concurrently.
    ///
    /// Refresh failures are reported, not returned: each feed keeps its
    /// error in its own state.
    #[instrument(skip(self))]
    pub async fn start(&self) -> StartReport {
        let mut report = StartReport::default();
        for sync in self.feeds() {
            report.restored += sync.restore_from_cache().await;
        }

        let results = futures::future::join_all(self.feeds().map(|sync| async move {
            (sync.feed().to_string(), sync.refresh().await)
        }))
        .await;

        for (feed, result) in results {
            match result {
                Ok(_) => report.refreshed.push(feed),
                Err(e) => {
                    warn!(feed = %feed, error = %e, "Initial refresh failed");
                    report.failed.push((feed, e));
                }
            }
        }

        info!(
            restored = report.restored,
            refreshed = report.refreshed.len(),
            failed = report.failed.len(),
            "Core service started"
        );
        report
    }

    /// Parse `reference`, switch the reader to it and refresh the passage.
    ///
    /// A fetch already in flight may have been started for an older
    /// reference, so it is waited out and the passage fetched again. On
    /// failure the previous passage stays current unless another call has
    /// switched it since.
    #[instrument(skip(self))]
    pub async fn open_passage(&self, reference: &str) -> Result<RefreshOutcome> {
        let (Some(passage), Some(sync)) = (&self.inner.passage, &self.inner.bible) else {
            return Err(CoreError::FeatureDisabled("bible"));
        };
        let reference = Reference::parse(reference)?;
        let previous = passage.set_passage(reference.clone());
        loop {
            match sync.refresh().await {
                Ok(RefreshOutcome {
                    fetch: FetchOutcome::Coalesced,
                    ..
                }) => {
                    debug!(reference = %reference, "Passage fetch in flight, waiting to refetch");
                    sync.wait_for_fetch().await;
                }
                Ok(outcome) => return Ok(outcome),
                Err(e) => {
                    // Keep the reference in step with the verses still shown.
                    if passage.passage() == reference {
                        passage.set_passage(previous);
                    }
                    return Err(e.into());
                }
            }
        }
    }

    pub fn playlist(&self) -> Option<&Arc<RemoteListSynchronizer>> {
        self.inner.playlist.as_ref()
    }

    pub fn announcements(&self) -> Option<&Arc<RemoteListSynchronizer>> {
        self.inner.announcements.as_ref()
    }

    pub fn bible(&self) -> Option<&Arc<RemoteListSynchronizer>> {
        self.inner.bible.as_ref()
    }

    /// Reference currently loaded in the reader.
    pub fn current_passage(&self) -> Option<Reference> {
        self.inner.passage.as_ref().map(|p| p.passage())
    }

    pub fn preferences(&self) -> &PreferencesStore {
        &self.inner.preferences
    }

    pub fn notes(&self) -> &NotesRepository {
        &self.inner.notes
    }

    pub fn verse_marks(&self) -> &VerseMarks {
        &self.inner.verse_marks
    }

    pub fn settings_store(&self) -> Arc<dyn SettingsStore> {
        Arc::clone(&self.inner.settings)
    }

    /// Subscribe to content and library events.
    pub fn events(&self) -> Receiver<CoreEvent> {
        self.inner.events.subscribe()
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.inner.events
    }
}

impl std::fmt::Debug for CoreService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreService")
            .field("playlist", &self.inner.playlist.is_some())
            .field("announcements", &self.inner.announcements.is_some())
            .field("bible", &self.inner.bible.is_some())
            .finish_non_exhaustive()
    }
}

async fn resolve_settings_store(config: &CoreConfig) -> Result<Arc<dyn SettingsStore>> {
    if let Some(store) = &config.settings_store {
        return Ok(Arc::clone(store));
    }
    match &config.settings_path {
        Some(path) => open_settings_store(path.clone()).await,
        None => Err(CoreError::CapabilityMissing {
            capability: "SettingsStore".to_string(),
            message: "No settings store injected and no settings path configured".to_string(),
        }),
    }
}

#[cfg(feature = "desktop-shims")]
async fn open_settings_store(path: std::path::PathBuf) -> Result<Arc<dyn SettingsStore>> {
    let store = bridge_desktop::SqliteSettingsStore::new(path)
        .await
        .map_err(|e| CoreError::InitializationFailed(e.to_string()))?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "desktop-shims"))]
async fn open_settings_store(_path: std::path::PathBuf) -> Result<Arc<dyn SettingsStore>> {
    Err(CoreError::CapabilityMissing {
        capability: "SettingsStore".to_string(),
        message: "Opening a settings file requires the 'desktop-shims' feature".to_string(),
    })
}
