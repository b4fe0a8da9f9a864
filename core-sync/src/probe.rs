//! # Item Probing
//!
//! A probe pass checks every current item once and keeps the survivors in
//! scan order.
//!
//! ## Modes
//!
//! - **Sequential**: the prober drives a shared, stateful channel (the
//!   embedded player). Item *i+1* is dispatched only after item *i* reported
//!   ready, failed, or timed out.
//! - **Concurrent**: the prober is a stateless status check. Up to
//!   `concurrency` probes run at once; results are still reported in scan
//!   order.
//!
//! Every probe is bounded by the per-item timeout. A probe that times out is
//! `Invalid`, never retried. For probes on the shared surface the timeout
//! starts once the surface is held, so a slow selection load never counts
//! against the item waiting behind it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bridge_traits::content::{ContentSurface, LoadOutcome, LoadRequest};
use bridge_traits::error::Result as BridgeResult;
use core_async::sync::{Mutex, MutexGuard};
use core_async::time::timeout;
use futures::stream::{self, StreamExt};
use tracing::debug;

use crate::item::{RemoteItem, ValidationLedger, ValidationState};

/// Verdict for a single probed item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Valid,
    Invalid { reason: String },
}

impl ProbeOutcome {
    pub fn invalid(reason: impl Into<String>) -> Self {
        ProbeOutcome::Invalid {
            reason: reason.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ProbeOutcome::Valid)
    }
}

/// Checks whether an item can actually be loaded.
///
/// Probers report failures as [`ProbeOutcome::Invalid`]; there is no error
/// channel because a failed probe only ever drops the item.
#[async_trait]
pub trait ItemProber: Send + Sync {
    async fn probe(&self, item: &RemoteItem) -> ProbeOutcome;

    /// Probe `item`, treating anything slower than `limit` as invalid.
    async fn probe_within(&self, item: &RemoteItem, limit: Duration) -> ProbeOutcome {
        match timeout(limit, self.probe(item)).await {
            Ok(outcome) => outcome,
            Err(_) => timed_out(limit),
        }
    }

    /// Whether probes go through a stateful channel that cannot serve two
    /// requests at once. Such probers always run sequentially.
    fn shares_channel(&self) -> bool {
        true
    }
}

/// The process-wide content surface, serialized so that at most one load is
/// outstanding at any time.
///
/// Dropping a `load` future releases the surface, which is how timed out
/// probes and superseded selections give it up.
#[derive(Clone)]
pub struct SharedSurface {
    surface: Arc<dyn ContentSurface>,
    busy: Arc<Mutex<()>>,
}

impl SharedSurface {
    pub fn new(surface: Arc<dyn ContentSurface>) -> Self {
        Self {
            surface,
            busy: Arc::new(Mutex::new(())),
        }
    }

    /// Wait until no other load is outstanding and hold the surface.
    pub async fn acquire(&self) -> SurfaceSlot<'_> {
        SurfaceSlot {
            surface: self.surface.as_ref(),
            _guard: self.busy.lock().await,
        }
    }

    pub async fn load(&self, request: LoadRequest) -> BridgeResult<LoadOutcome> {
        self.acquire().await.load(request).await
    }

    pub async fn stop(&self) -> BridgeResult<()> {
        self.surface.stop().await
    }
}

/// Exclusive hold on a [`SharedSurface`], released on drop.
pub struct SurfaceSlot<'a> {
    surface: &'a dyn ContentSurface,
    _guard: MutexGuard<'a, ()>,
}

impl SurfaceSlot<'_> {
    pub async fn load(&self, request: LoadRequest) -> BridgeResult<LoadOutcome> {
        self.surface.load(request).await
    }
}

impl std::fmt::Debug for SharedSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSurface").finish_non_exhaustive()
    }
}

/// Probes items by cueing them on the content surface.
#[derive(Debug, Clone)]
pub struct SurfaceProber {
    surface: SharedSurface,
}

impl SurfaceProber {
    pub fn new(surface: SharedSurface) -> Self {
        Self { surface }
    }
}

#[async_trait]
impl ItemProber for SurfaceProber {
    async fn probe(&self, item: &RemoteItem) -> ProbeOutcome {
        let slot = self.surface.acquire().await;
        surface_verdict(slot.load(probe_request(item)).await)
    }

    async fn probe_within(&self, item: &RemoteItem, limit: Duration) -> ProbeOutcome {
        let slot = self.surface.acquire().await;
        match timeout(limit, slot.load(probe_request(item))).await {
            Ok(result) => surface_verdict(result),
            Err(_) => timed_out(limit),
        }
    }
}

fn probe_request(item: &RemoteItem) -> LoadRequest {
    LoadRequest::probe(item.id.clone(), item.payload.clone())
}

fn surface_verdict(result: BridgeResult<LoadOutcome>) -> ProbeOutcome {
    match result {
        Ok(LoadOutcome::Ready) => ProbeOutcome::Valid,
        Ok(LoadOutcome::Failed { reason }) => ProbeOutcome::Invalid { reason },
        Err(e) => ProbeOutcome::invalid(e.to_string()),
    }
}

fn timed_out(limit: Duration) -> ProbeOutcome {
    ProbeOutcome::invalid(format!("probe timed out after {}ms", limit.as_millis()))
}

/// Result of one probe pass.
#[derive(Debug, Clone, Default)]
pub struct ProbeReport {
    /// Items that probed valid, in scan order
    pub valid: Vec<RemoteItem>,
    pub invalid: Vec<(RemoteItem, String)>,
    pub ledger: ValidationLedger,
}

impl ProbeReport {
    pub fn invalid_ids(&self) -> impl Iterator<Item = &str> {
        self.invalid.iter().map(|(item, _)| item.id.as_str())
    }
}

/// Runs probe passes with a per-item timeout.
#[derive(Debug, Clone, Copy)]
pub struct ProbeRunner {
    timeout: Duration,
    concurrency: usize,
}

impl ProbeRunner {
    pub fn new(timeout: Duration, concurrency: usize) -> Self {
        Self {
            timeout,
            concurrency: concurrency.max(1),
        }
    }

    /// Whether a pass with `prober` would dispatch probes concurrently.
    pub fn is_concurrent(&self, prober: &dyn ItemProber) -> bool {
        self.concurrency > 1 && !prober.shares_channel()
    }

    pub async fn run(&self, prober: &dyn ItemProber, items: &[RemoteItem]) -> ProbeReport {
        let mut report = ProbeReport {
            ledger: ValidationLedger::new(items.iter().map(|item| item.id.as_str())),
            ..ProbeReport::default()
        };

        if self.is_concurrent(prober) {
            let outcomes: Vec<ProbeOutcome> = stream::iter(items)
                .map(|item| self.probe_one(prober, item))
                .buffered(self.concurrency)
                .collect()
                .await;

            for (item, outcome) in items.iter().zip(outcomes) {
                report.ledger.advance(&item.id, ValidationState::Checking);
                record(&mut report, item, outcome);
            }
        } else {
            for item in items {
                report.ledger.advance(&item.id, ValidationState::Checking);
                let outcome = self.probe_one(prober, item).await;
                record(&mut report, item, outcome);
            }
        }

        report
    }

    async fn probe_one(&self, prober: &dyn ItemProber, item: &RemoteItem) -> ProbeOutcome {
        prober.probe_within(item, self.timeout).await
    }
}

fn record(report: &mut ProbeReport, item: &RemoteItem, outcome: ProbeOutcome) {
    match outcome {
        ProbeOutcome::Valid => {
            report.ledger.advance(&item.id, ValidationState::Valid);
            report.valid.push(item.clone());
        }
        ProbeOutcome::Invalid { reason } => {
            debug!(item_id = %item.id, reason = %reason, "Item failed probe");
            report.ledger.advance(&item.id, ValidationState::Invalid);
            report.invalid.push((item.clone(), reason));
        }
    }
}
