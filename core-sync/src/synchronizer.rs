//! # Remote List Synchronizer
//!
//! Keeps a locally displayed list consistent with a remote collection.
//!
//! ## Workflow
//!
//! 1. **Restore**: seed the list from the cache record so something is shown
//!    before the network answers.
//! 2. **Fetch**: single-flight GET through the [`CollectionSource`], with
//!    fixed-delay retries for transient failures, followed by the
//!    [`StaticFilter`].
//! 3. **Probe**: optionally check every item with an [`ItemProber`] and drop
//!    the ones that fail or time out.
//! 4. **Select**: present one item on the shared content surface. Items that
//!    fail to load, now or later, are removed and the next one is selected.
//!
//! All state changes go through one watch channel, so subscribers always see
//! a consistent [`SyncState`].
//!
//! ## Usage
//!
//! ```ignore
//! let sync = RemoteListSynchronizer::builder(Arc::new(source))
//!     .prober(Arc::new(prober))
//!     .cache(CacheRepository::new(store, "worship"))
//!     .events(bus.clone())
//!     .build();
//!
//! sync.restore_from_cache().await;
//! sync.refresh().await?;
//! let mut updates = sync.subscribe();
//! ```

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bridge_traits::content::{LoadOutcome, LoadRequest};
use bridge_traits::time::{Clock, SystemClock};
use core_async::sync::watch;
use core_runtime::config::{ProbeSchedule, SyncTuning};
use core_runtime::events::{ContentEvent, CoreEvent, EventBus};
use tracing::{debug, info, instrument, warn};

use crate::cache::CacheRepository;
use crate::error::{ErrorKind, Result, SyncError};
use crate::filter::StaticFilter;
use crate::item::RemoteItem;
use crate::probe::{ItemProber, ProbeRunner, SharedSurface};
use crate::retry::RetryPolicy;
use crate::selection::SelectionTracker;
use crate::source::CollectionSource;
use crate::state::{StateError, SyncState};

/// Result of [`RemoteListSynchronizer::fetch_collection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The list was replaced with `item_count` items.
    Updated { item_count: usize, rejected: usize },
    /// Another fetch was already in flight; this call did nothing.
    Coalesced,
}

/// Result of [`RemoteListSynchronizer::validate_all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    Completed { surviving: usize, dropped: usize },
    /// A pass was already running; this call did nothing.
    AlreadyRunning,
    /// No prober configured or nothing to probe.
    Skipped,
}

/// Result of [`RemoteListSynchronizer::select`] and
/// [`RemoteListSynchronizer::report_playback_error`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOutcome {
    /// The item is presented (or there is no surface to present on).
    Loaded { item_id: String },
    /// The id is not in the current list.
    Ignored,
    /// The same item is already loading.
    AlreadyLoading,
    /// A newer selection replaced this one before it settled.
    Superseded,
    /// Every remaining item failed to load.
    Exhausted,
}

/// Result of [`RemoteListSynchronizer::refresh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub fetch: FetchOutcome,
    pub validation: Option<ValidationOutcome>,
}

/// Resets an in-progress flag when dropped.
struct FlagGuard<'a>(&'a AtomicBool);

impl<'a> FlagGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlagGuard(flag))
    }
}

impl Drop for FlagGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Builder for [`RemoteListSynchronizer`].
pub struct SynchronizerBuilder {
    source: Arc<dyn CollectionSource>,
    filter: StaticFilter,
    prober: Option<Arc<dyn ItemProber>>,
    surface: Option<SharedSurface>,
    cache: Option<CacheRepository>,
    clock: Arc<dyn Clock>,
    events: Option<EventBus>,
    tuning: SyncTuning,
}

impl SynchronizerBuilder {
    pub fn filter(mut self, filter: StaticFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn prober(mut self, prober: Arc<dyn ItemProber>) -> Self {
        self.prober = Some(prober);
        self
    }

    /// Surface used to present the selected item.
    pub fn surface(mut self, surface: SharedSurface) -> Self {
        self.surface = Some(surface);
        self
    }

    pub fn cache(mut self, cache: CacheRepository) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn tuning(mut self, tuning: SyncTuning) -> Self {
        self.tuning = tuning;
        self
    }

    pub fn build(self) -> RemoteListSynchronizer {
        let (state, _) = watch::channel(SyncState::default());
        RemoteListSynchronizer {
            feed: self.source.name().to_string(),
            source: self.source,
            filter: self.filter,
            prober: self.prober,
            surface: self.surface,
            cache: self.cache,
            clock: self.clock,
            events: self.events,
            retry: RetryPolicy::from(&self.tuning),
            runner: ProbeRunner::new(self.tuning.probe_timeout, self.tuning.probe_concurrency),
            schedule: self.tuning.probe_schedule,
            state,
            fetching: AtomicBool::new(false),
            validating: AtomicBool::new(false),
            selection: SelectionTracker::new(),
        }
    }
}

/// Fetches, filters, probes and selects items of one remote collection.
pub struct RemoteListSynchronizer {
    feed: String,
    source: Arc<dyn CollectionSource>,
    filter: StaticFilter,
    prober: Option<Arc<dyn ItemProber>>,
    surface: Option<SharedSurface>,
    cache: Option<CacheRepository>,
    clock: Arc<dyn Clock>,
    events: Option<EventBus>,
    retry: RetryPolicy,
    runner: ProbeRunner,
    schedule: ProbeSchedule,
    state: watch::Sender<SyncState>,
    fetching: AtomicBool,
    validating: AtomicBool,
    selection: SelectionTracker,
}

impl RemoteListSynchronizer {
    pub fn builder(source: Arc<dyn CollectionSource>) -> SynchronizerBuilder {
        SynchronizerBuilder {
            source,
            filter: StaticFilter::default(),
            prober: None,
            surface: None,
            cache: None,
            clock: Arc::new(SystemClock),
            events: None,
            tuning: SyncTuning::default(),
        }
    }

    /// Label of the underlying source.
    pub fn feed(&self) -> &str {
        &self.feed
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> SyncState {
        self.state.borrow().clone()
    }

    /// URL for opening `item_id` outside the app.
    pub fn external_url(&self, item_id: &str) -> Option<String> {
        let state = self.state.borrow();
        state
            .item(item_id)
            .and_then(|item| self.source.external_url(item))
    }

    /// Seed the list from the cache record. Returns the number of items
    /// restored.
    ///
    /// Does nothing when the list already has items, so a restore racing a
    /// fetch never overwrites fresher data.
    #[instrument(skip(self), fields(feed = %self.feed))]
    pub async fn restore_from_cache(&self) -> usize {
        let Some(cache) = &self.cache else {
            return 0;
        };

        let record = match cache.load().await {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "Failed to read cache record");
                return 0;
            }
        };

        let seed = record.seed_items();
        let mut restored = 0;
        let mut selected = None;
        self.state.send_modify(|state| {
            if state.last_checked_at.is_none() {
                state.last_checked_at = record.last_checked_at;
            }
            if !state.items.is_empty() || seed.is_empty() {
                return;
            }
            restored = seed.len();
            state.items = seed;
            state.fetched_at = record.fetched_at;
            if state.select_first_if_unset() {
                selected = state.selected.clone();
            }
        });

        if restored > 0 {
            info!(restored, "Restored items from cache");
            if selected.is_some() {
                self.emit(ContentEvent::SelectionChanged {
                    feed: self.feed.clone(),
                    item_id: selected,
                });
            }
        }
        restored
    }

    /// Wait until no fetch is in flight.
    pub async fn wait_for_fetch(&self) {
        let mut state = self.state.subscribe();
        while self.fetching.load(Ordering::Acquire) {
            if state.wait_for(|s| !s.is_loading).await.is_err() {
                return;
            }
            // The flag is released just after the state settles.
            core_async::task::yield_now().await;
        }
    }

    /// Fetch the collection and replace the list.
    ///
    /// Single-flight: while a fetch is running, further calls return
    /// [`FetchOutcome::Coalesced`] immediately. On failure the previous
    /// items are left untouched.
    #[instrument(skip(self), fields(feed = %self.feed))]
    pub async fn fetch_collection(&self) -> Result<FetchOutcome> {
        let Some(_guard) = FlagGuard::acquire(&self.fetching) else {
            debug!("Fetch already in flight, coalescing");
            return Ok(FetchOutcome::Coalesced);
        };

        self.state.send_modify(|state| state.is_loading = true);
        self.emit(ContentEvent::FetchStarted {
            feed: self.feed.clone(),
        });

        let max_attempts = self.retry.max_attempts;
        let result = self
            .retry
            .run(
                || self.source.fetch(),
                |attempt, err| {
                    self.emit(ContentEvent::FetchRetrying {
                        feed: self.feed.clone(),
                        attempt,
                        max_attempts,
                        reason: err.to_string(),
                    })
                },
            )
            .await;

        match result {
            Ok(raw) => self.apply_fetched(raw).await,
            Err(err) => {
                self.apply_fetch_failure(&err);
                Err(err)
            }
        }
    }

    async fn apply_fetched(&self, raw: Vec<RemoteItem>) -> Result<FetchOutcome> {
        let outcome = self.filter.apply(raw);
        for (item, reason) in &outcome.rejected {
            debug!(item_id = %item.id, reason = %reason, "Item rejected by filter");
        }

        let fetched_at = self.clock.now();
        let item_count = outcome.kept.len();
        let rejected = outcome.rejected.len();

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.save_items(&outcome.kept, fetched_at).await {
                warn!(error = %e, "Failed to persist fetched items");
            }
        }

        let mut previous = None;
        let mut selected = None;
        self.state.send_modify(|state| {
            previous = state.selected.clone();
            state.items = outcome.kept;
            state.fetched_at = Some(fetched_at);
            state.is_loading = false;
            state.reconcile_selection();
            state.select_first_if_unset();
            state.error = if state.items.is_empty() {
                Some(StateError::from(&SyncError::NoItems))
            } else {
                None
            };
            selected = state.selected.clone();
        });

        info!(item_count, rejected, "Fetch completed");
        self.emit(ContentEvent::FetchCompleted {
            feed: self.feed.clone(),
            item_count,
            rejected_count: rejected,
        });
        if previous != selected {
            self.emit(ContentEvent::SelectionChanged {
                feed: self.feed.clone(),
                item_id: selected,
            });
        }

        if item_count == 0 {
            return Err(SyncError::NoItems);
        }
        Ok(FetchOutcome::Updated {
            item_count,
            rejected,
        })
    }

    fn apply_fetch_failure(&self, err: &SyncError) {
        warn!(error = %err, "Fetch failed");
        let fallback = self.source.fallback_items();

        self.state.send_modify(|state| {
            state.is_loading = false;
            if state.items.is_empty() {
                state.items = fallback;
                state.select_first_if_unset();
                state.error = Some(StateError::new(
                    err.kind(),
                    format!("No items found: {}", err),
                ));
            } else {
                state.error = Some(StateError::from(err));
            }
        });

        self.emit(ContentEvent::FetchFailed {
            feed: self.feed.clone(),
            message: err.to_string(),
        });
    }

    /// Probe every current item and drop the ones that fail.
    ///
    /// A call while a pass is running is a no-op. Items removed or replaced
    /// while the pass runs are not resurrected: the pass only removes.
    #[instrument(skip(self), fields(feed = %self.feed))]
    pub async fn validate_all(&self) -> ValidationOutcome {
        let Some(prober) = &self.prober else {
            return ValidationOutcome::Skipped;
        };
        let Some(_guard) = FlagGuard::acquire(&self.validating) else {
            debug!("Probe pass already running");
            return ValidationOutcome::AlreadyRunning;
        };

        let items = self.state.borrow().items.clone();
        if items.is_empty() {
            return ValidationOutcome::Skipped;
        }

        self.state.send_modify(|state| state.is_validating = true);
        self.emit(ContentEvent::ProbePassStarted {
            feed: self.feed.clone(),
            item_count: items.len(),
        });
        info!(
            item_count = items.len(),
            concurrent = self.runner.is_concurrent(prober.as_ref()),
            "Probe pass started"
        );

        let report = self.runner.run(prober.as_ref(), &items).await;
        let invalid: HashSet<&str> = report.invalid_ids().collect();
        let checked_at = self.clock.now();

        let mut previous = None;
        let mut selected = None;
        let mut surviving = 0;
        self.state.send_modify(|state| {
            previous = state.selected.clone();
            state.items.retain(|item| !invalid.contains(item.id.as_str()));
            state.is_validating = false;
            state.last_checked_at = Some(checked_at);
            state.reconcile_selection();
            if state.items.is_empty() {
                state.error = Some(StateError::from(&SyncError::NoPlayableItems));
            }
            selected = state.selected.clone();
            surviving = state.items.len();
        });

        if let Some(cache) = &self.cache {
            let valid = report.valid.iter().map(|item| item.id.as_str());
            if let Err(e) = cache.save_validation(valid, report.invalid_ids(), checked_at).await {
                warn!(error = %e, "Failed to persist probe results");
            }
        }

        let dropped = report.invalid.len();
        info!(surviving, dropped, "Probe pass completed");
        for (item, _) in &report.invalid {
            self.emit(ContentEvent::ItemRemoved {
                feed: self.feed.clone(),
                item_id: item.id.clone(),
            });
        }
        self.emit(ContentEvent::ProbePassCompleted {
            feed: self.feed.clone(),
            surviving,
            dropped,
        });

        if previous.is_some() && previous != selected {
            self.emit(ContentEvent::SelectionChanged {
                feed: self.feed.clone(),
                item_id: selected.clone(),
            });
            if let Some(next) = selected {
                self.select(&next).await;
            }
        }

        ValidationOutcome::Completed { surviving, dropped }
    }

    /// Select `item_id` and present it on the content surface.
    ///
    /// If the item fails to load it is removed and the next selection is
    /// tried, until one loads or the list is exhausted.
    #[instrument(skip(self), fields(feed = %self.feed))]
    pub async fn select(&self, item_id: &str) -> SelectOutcome {
        let mut target = item_id.to_string();

        loop {
            let Some(payload) = self
                .state
                .borrow()
                .item(&target)
                .map(|item| item.payload.clone())
            else {
                return SelectOutcome::Ignored;
            };

            let Some(ticket) = self.selection.begin(&target) else {
                return SelectOutcome::AlreadyLoading;
            };

            let has_surface = self.surface.is_some();
            let mut changed = false;
            self.state.send_modify(|state| {
                changed = state.selected.as_deref() != Some(target.as_str());
                state.selected = Some(target.clone());
                state.is_loading_selection = has_surface;
                if !has_surface {
                    state.has_playback_error = false;
                }
            });
            if changed {
                self.emit(ContentEvent::SelectionChanged {
                    feed: self.feed.clone(),
                    item_id: Some(target.clone()),
                });
            }

            let Some(surface) = &self.surface else {
                self.selection.finish(&ticket);
                return SelectOutcome::Loaded { item_id: target };
            };

            let request = LoadRequest::present(target.clone(), payload);
            let result = core_async::select! {
                biased;
                _ = ticket.token().cancelled() => None,
                result = surface.load(request) => Some(result),
            };

            let Some(result) = result else {
                debug!(item_id = %target, "Selection superseded");
                return SelectOutcome::Superseded;
            };
            if !self.selection.finish(&ticket) {
                return SelectOutcome::Superseded;
            }

            let reason = match result {
                Ok(LoadOutcome::Ready) => {
                    self.state.send_modify(|state| {
                        state.is_loading_selection = false;
                        state.has_playback_error = false;
                    });
                    return SelectOutcome::Loaded { item_id: target };
                }
                Ok(LoadOutcome::Failed { reason }) => reason,
                Err(e) => e.to_string(),
            };

            warn!(item_id = %target, reason = %reason, "Selected item failed to load");
            self.state
                .send_modify(|state| state.is_loading_selection = false);
            self.emit(ContentEvent::PlaybackFailed {
                feed: self.feed.clone(),
                item_id: target.clone(),
                reason,
            });

            match self.drop_item(&target).await {
                Some(next) => target = next,
                None => return SelectOutcome::Exhausted,
            }
        }
    }

    /// Remove an item that turned out to be unusable.
    ///
    /// Returns false when the id was not in the list. A removed selection
    /// moves to the first remaining item without loading it.
    #[instrument(skip(self), fields(feed = %self.feed))]
    pub async fn remove_invalid(&self, item_id: &str) -> bool {
        if !self.state.borrow().contains(item_id) {
            return false;
        }
        if self.selection.pending().as_deref() == Some(item_id) {
            self.selection.cancel();
        }
        self.drop_item(item_id).await;
        true
    }

    /// Handle a failure the surface reported after the item was presented.
    ///
    /// The item is removed and the next one selected and loaded. Returns
    /// [`SelectOutcome::Ignored`] when the id is unknown or was not the
    /// selection.
    #[instrument(skip(self, reason), fields(feed = %self.feed))]
    pub async fn report_playback_error(&self, item_id: &str, reason: &str) -> SelectOutcome {
        if !self.state.borrow().contains(item_id) {
            return SelectOutcome::Ignored;
        }

        let err = SyncError::ItemUnavailable {
            item_id: item_id.to_string(),
            reason: reason.to_string(),
        };
        warn!(error = %err, "Playback failed");

        self.selection.cancel();
        self.state.send_modify(|state| {
            state.has_playback_error = true;
            state.is_loading_selection = false;
        });
        self.emit(ContentEvent::PlaybackFailed {
            feed: self.feed.clone(),
            item_id: item_id.to_string(),
            reason: reason.to_string(),
        });

        match self.drop_item(item_id).await {
            Some(next) => self.select(&next).await,
            None if self.snapshot().is_empty() => SelectOutcome::Exhausted,
            // The failing item was not the selection; nothing to reload.
            None => SelectOutcome::Ignored,
        }
    }

    /// Fetch, then probe when the schedule says so.
    #[instrument(skip(self), fields(feed = %self.feed))]
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        let fetch = self.fetch_collection().await?;
        let validation = match fetch {
            FetchOutcome::Updated { .. } if self.probe_due() => Some(self.validate_all().await),
            _ => None,
        };
        Ok(RefreshOutcome { fetch, validation })
    }

    fn probe_due(&self) -> bool {
        if self.prober.is_none() {
            return false;
        }
        match self.schedule {
            ProbeSchedule::AfterEveryFetch => true,
            ProbeSchedule::Manual => false,
            ProbeSchedule::WhenStale(max_age) => match self.state.borrow().last_checked_at {
                None => true,
                Some(checked_at) => {
                    let age = self.clock.now().signed_duration_since(checked_at);
                    age.to_std().map_or(false, |age| age >= max_age)
                }
            },
        }
    }

    /// Remove `item_id` from state and cache. Returns the new selection when
    /// the removed item was selected and something remains.
    async fn drop_item(&self, item_id: &str) -> Option<String> {
        let mut was_selected = false;
        let mut selected = None;
        self.state.send_modify(|state| {
            was_selected = state.selected.as_deref() == Some(item_id);
            state.items.retain(|item| item.id != item_id);
            state.reconcile_selection();
            if state.items.is_empty() {
                state.error = Some(StateError::from(&SyncError::NoPlayableItems));
            }
            selected = state.selected.clone();
        });

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.forget(item_id).await {
                warn!(error = %e, item_id, "Failed to remove item from cache");
            }
        }

        self.emit(ContentEvent::ItemRemoved {
            feed: self.feed.clone(),
            item_id: item_id.to_string(),
        });

        if !was_selected {
            return None;
        }
        self.emit(ContentEvent::SelectionChanged {
            feed: self.feed.clone(),
            item_id: selected.clone(),
        });
        selected
    }

    fn emit(&self, event: ContentEvent) {
        if let Some(events) = &self.events {
            // No subscribers is not an error.
            let _ = events.emit(CoreEvent::Content(event));
        }
    }

    /// Current error kind, if any.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.state.borrow().error.as_ref().map(|e| e.kind)
    }
}

impl std::fmt::Debug for RemoteListSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteListSynchronizer")
            .field("feed", &self.feed)
            .field("probing", &self.prober.is_some())
            .field("schedule", &self.schedule)
            .finish_non_exhaustive()
    }
}
