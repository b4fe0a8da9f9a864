//! Integration tests for the remote list synchronizer.
//!
//! These tests cover:
//! - Static filtering of fetched collections
//! - Retry of transient fetch failures and immediate permanent failures
//! - Probe passes (sequential, concurrent, timeouts, re-entrancy)
//! - Selection, supersession and playback failures
//! - Cache restore and probe scheduling

mod common;

use std::sync::Arc;
use std::time::Duration;

use bridge_traits::storage::SettingsStore;
use chrono::Duration as ChronoDuration;
use common::*;
use core_runtime::config::{ProbeSchedule, SyncTuning};
use core_runtime::events::{ContentEvent, CoreEvent, EventBus};
use core_sync::{
    CacheRepository, ErrorKind, FetchOutcome, RemoteItem, RemoteListSynchronizer, SelectOutcome,
    SharedSurface, StaticFilter, SyncError, ValidationOutcome,
};

fn tuning(schedule: ProbeSchedule) -> SyncTuning {
    SyncTuning {
        probe_schedule: schedule,
        ..SyncTuning::default()
    }
}

fn abc() -> Vec<RemoteItem> {
    vec![video("A", "Morning Worship"), video("B", "Choir Rehearsal"), video("C", "Evening Prayer")]
}

// ============================================================================
// Fetch
// ============================================================================

#[tokio::test]
async fn test_private_video_is_excluded_from_fetch() {
    let source = Arc::new(FakeSource::new(vec![
        video("1", "Sunday Service"),
        video("2", "Private video"),
        video("3", "Bible Study"),
    ]));
    let sync = RemoteListSynchronizer::builder(source).build();

    let outcome = sync.fetch_collection().await.unwrap();

    assert_eq!(outcome, FetchOutcome::Updated { item_count: 2, rejected: 1 });
    let state = sync.snapshot();
    assert_eq!(ids(&state.items), vec!["1", "3"]);
    assert_eq!(state.selected.as_deref(), Some("1"));
    assert!(state.error.is_none());
    assert!(!state.is_loading);
}

#[tokio::test(start_paused = true)]
async fn test_fetch_succeeds_on_third_attempt() {
    let source = Arc::new(FakeSource::scripted(vec![
        Err(SyncError::network("operation timed out")),
        Err(SyncError::network("operation timed out")),
        Ok(abc()),
    ]));
    let bus = EventBus::new(64);
    let mut events = bus.subscribe();
    let sync = RemoteListSynchronizer::builder(source.clone())
        .events(bus.clone())
        .build();

    let started = tokio::time::Instant::now();
    let outcome = sync.fetch_collection().await.unwrap();

    assert_eq!(outcome, FetchOutcome::Updated { item_count: 3, rejected: 0 });
    assert_eq!(source.calls(), 3);
    assert!(started.elapsed() >= Duration::from_secs(10));
    let state = sync.snapshot();
    assert!(state.error.is_none());
    assert_eq!(state.items.len(), 3);

    let mut retries = 0;
    while let Ok(event) = events.try_recv() {
        if let CoreEvent::Content(ContentEvent::FetchRetrying { max_attempts, .. }) = event {
            assert_eq!(max_attempts, 3);
            retries += 1;
        }
    }
    assert_eq!(retries, 2);
}

#[tokio::test(start_paused = true)]
async fn test_forbidden_is_not_retried_and_keeps_items() {
    let source = Arc::new(FakeSource::new(abc()));
    let sync = RemoteListSynchronizer::builder(source.clone()).build();
    sync.fetch_collection().await.unwrap();

    source.set_error(SyncError::HttpStatus { status: 403 });
    let err = sync.fetch_collection().await.unwrap_err();

    assert_eq!(err, SyncError::HttpStatus { status: 403 });
    assert_eq!(source.calls(), 2);
    let state = sync.snapshot();
    assert_eq!(ids(&state.items), vec!["A", "B", "C"]);
    assert_eq!(state.error.as_ref().map(|e| e.kind), Some(ErrorKind::HttpStatus));
    assert!(!state.is_loading);
    assert_selection_invariant(&state);
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_retries_surface_last_error() {
    let source = Arc::new(FakeSource::new(Vec::new()));
    source.set_error(SyncError::network("connection reset"));
    let sync = RemoteListSynchronizer::builder(source.clone()).build();

    let err = sync.fetch_collection().await.unwrap_err();

    assert!(err.is_transient());
    assert_eq!(source.calls(), 3);
    let state = sync.snapshot();
    let error = state.error.unwrap();
    assert_eq!(error.kind, ErrorKind::Network);
    assert!(error.message.starts_with("No items found"));
}

#[tokio::test]
async fn test_fetch_failure_shows_fallback_items() {
    let fallback = vec![RemoteItem::new("1", "Sunday School", "Join us at 11 AM every Sunday")];
    let source = Arc::new(
        FakeSource::new(Vec::new()).with_fallback(fallback.clone()),
    );
    source.set_error(SyncError::Decode("expected value at line 1".into()));
    let sync = RemoteListSynchronizer::builder(source)
        .filter(StaticFilter::permissive())
        .build();

    assert!(sync.fetch_collection().await.is_err());

    let state = sync.snapshot();
    assert_eq!(state.items, fallback);
    assert_eq!(state.selected.as_deref(), Some("1"));
    assert_eq!(state.error.map(|e| e.kind), Some(ErrorKind::Decode));
}

#[tokio::test]
async fn test_empty_collection_is_no_items() {
    let sync = RemoteListSynchronizer::builder(Arc::new(FakeSource::new(Vec::new()))).build();

    let err = sync.fetch_collection().await.unwrap_err();

    assert_eq!(err, SyncError::NoItems);
    let state = sync.snapshot();
    assert!(state.items.is_empty());
    assert_eq!(state.selected, None);
    assert_eq!(state.error.map(|e| e.kind), Some(ErrorKind::NoItems));
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_fetches_are_coalesced() {
    let source = Arc::new(FakeSource::new(abc()).with_delay(Duration::from_secs(1)));
    let sync = RemoteListSynchronizer::builder(source.clone()).build();

    let (first, second) = tokio::join!(sync.fetch_collection(), sync.fetch_collection());

    assert!(matches!(first, Ok(FetchOutcome::Updated { .. })));
    assert_eq!(second, Ok(FetchOutcome::Coalesced));
    assert_eq!(source.calls(), 1);

    // The flag is released once the fetch settles.
    assert!(matches!(
        sync.fetch_collection().await,
        Ok(FetchOutcome::Updated { .. })
    ));
}

#[tokio::test]
async fn test_refetch_keeps_surviving_selection() {
    let source = Arc::new(FakeSource::new(abc()));
    let sync = RemoteListSynchronizer::builder(source.clone()).build();
    sync.fetch_collection().await.unwrap();
    sync.select("C").await;

    source.set_items(vec![video("C", "Evening Prayer"), video("D", "Youth Night")]);
    sync.fetch_collection().await.unwrap();
    assert_eq!(sync.snapshot().selected.as_deref(), Some("C"));

    source.set_items(vec![video("D", "Youth Night")]);
    sync.fetch_collection().await.unwrap();
    assert_eq!(sync.snapshot().selected.as_deref(), Some("D"));
}

// ============================================================================
// Probe passes
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_probe_timeout_drops_item_and_moves_selection() {
    let prober = Arc::new(FakeProber::new());
    prober.set("B", ProbeBehavior::Hang);
    let surface = Arc::new(GatedSurface::new());
    let sync = RemoteListSynchronizer::builder(Arc::new(FakeSource::new(abc())))
        .prober(prober.clone())
        .surface(SharedSurface::new(surface.clone()))
        .build();
    sync.fetch_collection().await.unwrap();
    assert_eq!(sync.select("B").await, SelectOutcome::Loaded { item_id: "B".into() });

    let started = tokio::time::Instant::now();
    let outcome = sync.validate_all().await;

    assert_eq!(outcome, ValidationOutcome::Completed { surviving: 2, dropped: 1 });
    assert!(started.elapsed() >= Duration::from_secs(3));
    assert_eq!(prober.seen(), vec!["A", "B", "C"]);
    let state = sync.snapshot();
    assert_eq!(ids(&state.items), vec!["A", "C"]);
    assert_eq!(state.selected.as_deref(), Some("A"));
    assert!(!state.is_validating);
    assert_eq!(surface.completed().last().map(String::as_str), Some("A"));
}

#[tokio::test(start_paused = true)]
async fn test_all_items_invalid_is_no_playable_items() {
    let prober = Arc::new(FakeProber::new());
    for id in ["A", "B", "C"] {
        prober.set(id, ProbeBehavior::Invalid);
    }
    let sync = RemoteListSynchronizer::builder(Arc::new(FakeSource::new(abc())))
        .prober(prober)
        .build();
    sync.fetch_collection().await.unwrap();

    sync.validate_all().await;

    let state = sync.snapshot();
    assert!(state.items.is_empty());
    assert_eq!(state.selected, None);
    assert_eq!(state.error.map(|e| e.kind), Some(ErrorKind::NoPlayableItems));
}

#[tokio::test(start_paused = true)]
async fn test_second_probe_pass_is_a_noop_while_running() {
    let prober = Arc::new(FakeProber::new().with_delay(Duration::from_millis(500)));
    let sync = RemoteListSynchronizer::builder(Arc::new(FakeSource::new(abc())))
        .prober(prober.clone())
        .build();
    sync.fetch_collection().await.unwrap();

    let (first, second) = tokio::join!(sync.validate_all(), sync.validate_all());

    assert!(matches!(first, ValidationOutcome::Completed { .. }));
    assert_eq!(second, ValidationOutcome::AlreadyRunning);
    assert_eq!(prober.seen().len(), 3);
}

#[tokio::test]
async fn test_validate_without_prober_is_skipped() {
    let sync = RemoteListSynchronizer::builder(Arc::new(FakeSource::new(abc()))).build();
    sync.fetch_collection().await.unwrap();
    assert_eq!(sync.validate_all().await, ValidationOutcome::Skipped);
    assert_eq!(sync.snapshot().items.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_stateless_prober_runs_concurrently_in_order() {
    let prober = Arc::new(
        FakeProber::new()
            .stateless()
            .with_delay(Duration::from_secs(2)),
    );
    prober.set("B", ProbeBehavior::Invalid);
    let tuning = SyncTuning {
        probe_concurrency: 3,
        ..SyncTuning::default()
    };
    let sync = RemoteListSynchronizer::builder(Arc::new(FakeSource::new(abc())))
        .prober(prober)
        .tuning(tuning)
        .build();
    sync.fetch_collection().await.unwrap();

    let started = tokio::time::Instant::now();
    sync.validate_all().await;

    // Three 2s probes in parallel finish well before 6s.
    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(ids(&sync.snapshot().items), vec!["A", "C"]);
}

#[tokio::test(start_paused = true)]
async fn test_surface_prober_uses_probe_mode() {
    let surface = Arc::new(GatedSurface::new());
    surface.fail("C", "video unavailable");
    let shared = SharedSurface::new(surface.clone());
    let sync = RemoteListSynchronizer::builder(Arc::new(FakeSource::new(abc())))
        .prober(Arc::new(core_sync::SurfaceProber::new(shared.clone())))
        .surface(shared)
        .build();
    sync.fetch_collection().await.unwrap();

    sync.validate_all().await;

    assert_eq!(ids(&sync.snapshot().items), vec!["A", "B"]);
    assert_eq!(surface.requested(), vec!["A", "B", "C"]);
}

#[tokio::test(start_paused = true)]
async fn test_slow_selection_load_does_not_expire_waiting_check() {
    let surface = Arc::new(GatedSurface::new());
    surface.hold("A");
    let shared = SharedSurface::new(surface.clone());
    let sync = Arc::new(
        RemoteListSynchronizer::builder(Arc::new(FakeSource::new(abc())))
            .prober(Arc::new(core_sync::SurfaceProber::new(shared.clone())))
            .surface(shared)
            .build(),
    );
    sync.fetch_collection().await.unwrap();

    let selecting = {
        let sync = sync.clone();
        tokio::spawn(async move { sync.select("A").await })
    };
    surface.wait_for_request("A").await;
    let releasing = {
        let surface = surface.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(4)).await;
            surface.release("A");
        })
    };

    let outcome = sync.validate_all().await;
    releasing.await.unwrap();

    assert_eq!(selecting.await.unwrap(), SelectOutcome::Loaded { item_id: "A".into() });
    assert_eq!(outcome, ValidationOutcome::Completed { surviving: 3, dropped: 0 });
    let state = sync.snapshot();
    assert_eq!(ids(&state.items), vec!["A", "B", "C"]);
    assert_eq!(state.selected.as_deref(), Some("A"));
    assert_eq!(surface.requested(), vec!["A", "A", "B", "C"]);
}

// ============================================================================
// Selection
// ============================================================================

#[tokio::test]
async fn test_stale_selection_completion_is_discarded() {
    let surface = Arc::new(GatedSurface::new());
    surface.hold("A");
    let sync = Arc::new(
        RemoteListSynchronizer::builder(Arc::new(FakeSource::new(abc())))
            .surface(SharedSurface::new(surface.clone()))
            .build(),
    );
    sync.fetch_collection().await.unwrap();

    let pending = {
        let sync = sync.clone();
        tokio::spawn(async move { sync.select("A").await })
    };
    surface.wait_for_request("A").await;
    assert!(sync.snapshot().is_loading_selection);

    let outcome = sync.select("B").await;
    assert_eq!(outcome, SelectOutcome::Loaded { item_id: "B".into() });
    assert_eq!(pending.await.unwrap(), SelectOutcome::Superseded);

    surface.release("A");
    tokio::task::yield_now().await;

    let state = sync.snapshot();
    assert_eq!(state.selected.as_deref(), Some("B"));
    assert!(!state.is_loading_selection);
    assert_eq!(surface.completed(), vec!["B"]);
}

#[tokio::test]
async fn test_select_same_item_while_loading_is_noop() {
    let surface = Arc::new(GatedSurface::new());
    surface.hold("A");
    let sync = Arc::new(
        RemoteListSynchronizer::builder(Arc::new(FakeSource::new(abc())))
            .surface(SharedSurface::new(surface.clone()))
            .build(),
    );
    sync.fetch_collection().await.unwrap();

    let pending = {
        let sync = sync.clone();
        tokio::spawn(async move { sync.select("A").await })
    };
    surface.wait_for_request("A").await;

    assert_eq!(sync.select("A").await, SelectOutcome::AlreadyLoading);
    surface.release("A");
    assert_eq!(pending.await.unwrap(), SelectOutcome::Loaded { item_id: "A".into() });
    assert_eq!(surface.requested(), vec!["A"]);
}

#[tokio::test]
async fn test_select_unknown_id_is_ignored() {
    let sync = RemoteListSynchronizer::builder(Arc::new(FakeSource::new(abc()))).build();
    sync.fetch_collection().await.unwrap();

    assert_eq!(sync.select("Z").await, SelectOutcome::Ignored);
    assert_eq!(sync.snapshot().selected.as_deref(), Some("A"));
}

#[tokio::test]
async fn test_failed_selection_falls_through_to_next_item() {
    let surface = Arc::new(GatedSurface::new());
    surface.fail("B", "embedding disabled");
    let bus = EventBus::new(64);
    let mut events = bus.subscribe();
    let sync = RemoteListSynchronizer::builder(Arc::new(FakeSource::new(abc())))
        .surface(SharedSurface::new(surface.clone()))
        .events(bus.clone())
        .build();
    sync.fetch_collection().await.unwrap();

    let outcome = sync.select("B").await;

    assert_eq!(outcome, SelectOutcome::Loaded { item_id: "A".into() });
    let state = sync.snapshot();
    assert_eq!(ids(&state.items), vec!["A", "C"]);
    assert_eq!(state.selected.as_deref(), Some("A"));

    let mut playback_failed = false;
    while let Ok(event) = events.try_recv() {
        if let CoreEvent::Content(ContentEvent::PlaybackFailed { item_id, .. }) = event {
            assert_eq!(item_id, "B");
            playback_failed = true;
        }
    }
    assert!(playback_failed);
}

#[tokio::test]
async fn test_every_selection_failing_is_exhausted() {
    let surface = Arc::new(GatedSurface::new());
    for id in ["A", "B", "C"] {
        surface.fail(id, "removed");
    }
    let sync = RemoteListSynchronizer::builder(Arc::new(FakeSource::new(abc())))
        .surface(SharedSurface::new(surface))
        .build();
    sync.fetch_collection().await.unwrap();

    assert_eq!(sync.select("A").await, SelectOutcome::Exhausted);
    let state = sync.snapshot();
    assert!(state.items.is_empty());
    assert_eq!(state.selected, None);
    assert_eq!(state.error.map(|e| e.kind), Some(ErrorKind::NoPlayableItems));
}

#[tokio::test]
async fn test_playback_error_removes_item_and_loads_next() {
    let surface = Arc::new(GatedSurface::new());
    let sync = RemoteListSynchronizer::builder(Arc::new(FakeSource::new(abc())))
        .surface(SharedSurface::new(surface.clone()))
        .build();
    sync.fetch_collection().await.unwrap();
    sync.select("A").await;
    let mut updates = sync.subscribe();

    let outcome = sync.report_playback_error("A", "video became private").await;

    assert_eq!(outcome, SelectOutcome::Loaded { item_id: "B".into() });
    assert!(updates.has_changed().unwrap());
    let state = updates.borrow_and_update().clone();
    assert_eq!(ids(&state.items), vec!["B", "C"]);
    assert_eq!(state.selected.as_deref(), Some("B"));
    assert!(!state.has_playback_error);
    assert_eq!(surface.completed(), vec!["A", "B"]);
}

#[tokio::test]
async fn test_remove_invalid_reassigns_without_loading() {
    let surface = Arc::new(GatedSurface::new());
    let sync = RemoteListSynchronizer::builder(Arc::new(FakeSource::new(abc())))
        .surface(SharedSurface::new(surface.clone()))
        .build();
    sync.fetch_collection().await.unwrap();

    assert!(sync.remove_invalid("A").await);
    assert!(!sync.remove_invalid("A").await);

    let state = sync.snapshot();
    assert_eq!(ids(&state.items), vec!["B", "C"]);
    assert_eq!(state.selected.as_deref(), Some("B"));
    assert!(surface.requested().is_empty());
}

#[tokio::test]
async fn test_external_url_comes_from_source() {
    let sync = RemoteListSynchronizer::builder(Arc::new(FakeSource::new(abc()))).build();
    sync.fetch_collection().await.unwrap();

    assert_eq!(
        sync.external_url("A").as_deref(),
        Some("https://watch.test/payload-A")
    );
    assert_eq!(sync.external_url("missing"), None);
}

// ============================================================================
// Cache and scheduling
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_restore_seeds_only_valid_items() {
    let store = Arc::new(MemorySettings::new());
    let prober = Arc::new(FakeProber::new());
    prober.set("B", ProbeBehavior::Invalid);

    let first = RemoteListSynchronizer::builder(Arc::new(FakeSource::new(abc())))
        .prober(prober)
        .cache(CacheRepository::new(store.clone(), "worship"))
        .build();
    first.fetch_collection().await.unwrap();
    first.validate_all().await;

    let offline = Arc::new(FakeSource::new(Vec::new()));
    offline.set_error(SyncError::HttpStatus { status: 503 });
    let second = RemoteListSynchronizer::builder(offline)
        .cache(CacheRepository::new(store.clone(), "worship"))
        .build();

    assert_eq!(second.restore_from_cache().await, 2);
    assert!(second.fetch_collection().await.is_err());

    let state = second.snapshot();
    assert_eq!(ids(&state.items), vec!["A", "C"]);
    assert_eq!(state.selected.as_deref(), Some("A"));
    assert_eq!(state.error.map(|e| e.kind), Some(ErrorKind::HttpStatus));
    assert!(state.last_checked_at.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_restore_keeps_items_added_since_last_check() {
    let store = Arc::new(MemorySettings::new());
    let prober = Arc::new(FakeProber::new());
    prober.set("B", ProbeBehavior::Invalid);
    let source = Arc::new(FakeSource::new(abc()));

    let first = RemoteListSynchronizer::builder(source.clone())
        .prober(prober)
        .cache(CacheRepository::new(store.clone(), "worship"))
        .build();
    first.fetch_collection().await.unwrap();
    first.validate_all().await;

    let mut grown = abc();
    grown.push(video("D", "Youth Night"));
    source.set_items(grown);
    first.fetch_collection().await.unwrap();

    let second = RemoteListSynchronizer::builder(Arc::new(FakeSource::new(Vec::new())))
        .cache(CacheRepository::new(store.clone(), "worship"))
        .build();

    assert_eq!(second.restore_from_cache().await, 3);
    assert_eq!(ids(&second.snapshot().items), vec!["A", "C", "D"]);
}

#[tokio::test]
async fn test_cache_write_failure_does_not_fail_fetch() {
    let store = Arc::new(MemorySettings::new());
    store.fail_writes_to("worship.items");
    let sync = RemoteListSynchronizer::builder(Arc::new(FakeSource::new(abc())))
        .cache(CacheRepository::new(store.clone(), "worship"))
        .build();

    assert!(sync.fetch_collection().await.is_ok());
    assert_eq!(sync.snapshot().items.len(), 3);
    assert!(!store.has_key("worship.items").await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_refresh_probes_only_when_stale() {
    let clock = Arc::new(ManualClock::new());
    let prober = Arc::new(FakeProber::new());
    let sync = RemoteListSynchronizer::builder(Arc::new(FakeSource::new(abc())))
        .prober(prober.clone())
        .clock(clock.clone())
        .tuning(tuning(ProbeSchedule::WhenStale(Duration::from_secs(3600))))
        .build();

    let first = sync.refresh().await.unwrap();
    assert!(matches!(first.validation, Some(ValidationOutcome::Completed { .. })));

    clock.advance(ChronoDuration::minutes(30));
    let second = sync.refresh().await.unwrap();
    assert_eq!(second.validation, None);

    clock.advance(ChronoDuration::minutes(31));
    let third = sync.refresh().await.unwrap();
    assert!(third.validation.is_some());
    assert_eq!(prober.seen().len(), 6);
}

#[tokio::test(start_paused = true)]
async fn test_manual_schedule_never_probes_on_refresh() {
    let prober = Arc::new(FakeProber::new());
    let sync = RemoteListSynchronizer::builder(Arc::new(FakeSource::new(abc())))
        .prober(prober.clone())
        .tuning(tuning(ProbeSchedule::Manual))
        .build();

    let outcome = sync.refresh().await.unwrap();

    assert_eq!(outcome.validation, None);
    assert!(prober.seen().is_empty());
}

// ============================================================================
// Properties
// ============================================================================

fn collections() -> Vec<Vec<RemoteItem>> {
    vec![
        abc(),
        vec![
            video("1", "Deleted video"),
            video("2", "Sunday Service"),
            RemoteItem::new("3", "No payload", "").with_thumbnail("https://img.test/3.jpg"),
            video("4", "PRIVATE VIDEO"),
        ],
        vec![
            video("x", "This video is unavailable"),
            video("y", "Good Friday Service"),
            video("y", "Good Friday Service (duplicate)"),
            RemoteItem::new("z", "No thumbnail", "payload-z"),
        ],
        (0..20)
            .map(|i| {
                let title = if i % 4 == 0 { "Unavailable" } else { "Hymn" };
                video(&format!("v{i}"), &format!("{title} {i}"))
            })
            .collect(),
    ]
}

#[tokio::test]
async fn test_fetched_items_never_contain_denied_or_empty_entries() {
    for collection in collections() {
        let sync = RemoteListSynchronizer::builder(Arc::new(FakeSource::new(collection))).build();
        let _ = sync.fetch_collection().await;

        let state = sync.snapshot();
        for item in &state.items {
            let title = item.title.to_lowercase();
            assert!(!["deleted", "private", "unavailable"]
                .iter()
                .any(|m| title.contains(m)));
            assert!(!item.payload.is_empty());
        }
        assert_selection_invariant(&state);
    }
}

#[tokio::test(start_paused = true)]
async fn test_probe_pass_yields_subsequence_and_is_idempotent() {
    for collection in collections() {
        let prober = Arc::new(FakeProber::new().stateless());
        for (i, item) in collection.iter().enumerate() {
            if i % 3 == 1 {
                prober.set(&item.id, ProbeBehavior::Invalid);
            }
        }
        let sync = RemoteListSynchronizer::builder(Arc::new(FakeSource::new(collection)))
            .prober(prober)
            .build();
        if sync.fetch_collection().await.is_err() {
            continue;
        }

        let before = ids(&sync.snapshot().items);
        sync.validate_all().await;
        let once = ids(&sync.snapshot().items);
        assert_selection_invariant(&sync.snapshot());
        sync.validate_all().await;
        let twice = ids(&sync.snapshot().items);

        let mut rest = before.iter();
        for id in &once {
            assert!(rest.any(|b| b == id), "{once:?} is not a subsequence of {before:?}");
        }
        assert_eq!(once, twice);
        assert_selection_invariant(&sync.snapshot());
    }
}

#[tokio::test]
async fn test_selection_invariant_holds_across_operations() {
    let source = Arc::new(FakeSource::new(abc()));
    let sync = RemoteListSynchronizer::builder(source.clone()).build();
    let check = |sync: &RemoteListSynchronizer| assert_selection_invariant(&sync.snapshot());

    check(&sync);
    sync.fetch_collection().await.unwrap();
    check(&sync);
    sync.select("C").await;
    check(&sync);
    sync.remove_invalid("C").await;
    check(&sync);
    source.set_items(vec![video("D", "Youth Night")]);
    sync.fetch_collection().await.unwrap();
    check(&sync);
    sync.report_playback_error("D", "gone").await;
    check(&sync);
    source.set_items(Vec::new());
    let _ = sync.fetch_collection().await;
    check(&sync);
}
