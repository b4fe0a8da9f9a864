//! Fakes shared by the synchronizer integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bridge_traits::content::{ContentSurface, LoadOutcome, LoadRequest};
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::storage::SettingsStore;
use bridge_traits::time::Clock;
use bytes::Bytes;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use core_sync::{
    CollectionSource, ItemProber, ProbeOutcome, RemoteItem, Result, SyncError, SyncState,
};
use tokio::sync::Notify;

pub fn video(id: &str, title: &str) -> RemoteItem {
    RemoteItem::new(id, title, format!("payload-{id}")).with_thumbnail(format!("https://img.test/{id}.jpg"))
}

pub fn ids(items: &[RemoteItem]) -> Vec<String> {
    items.iter().map(|item| item.id.clone()).collect()
}

pub fn assert_selection_invariant(state: &SyncState) {
    if let Some(selected) = &state.selected {
        assert!(
            state.contains(selected),
            "selected {selected} is not in items {:?}",
            ids(&state.items)
        );
    }
}

/// Source answering from a script; the last response repeats.
pub struct FakeSource {
    responses: Mutex<VecDeque<Result<Vec<RemoteItem>>>>,
    last: Mutex<Result<Vec<RemoteItem>>>,
    delay: Duration,
    fallback: Vec<RemoteItem>,
    calls: AtomicUsize,
}

impl FakeSource {
    pub fn new(items: Vec<RemoteItem>) -> Self {
        Self::scripted(vec![Ok(items)])
    }

    pub fn scripted(responses: Vec<Result<Vec<RemoteItem>>>) -> Self {
        let mut responses: VecDeque<_> = responses.into();
        let last = responses.back().cloned().unwrap_or(Ok(Vec::new()));
        if responses.len() == 1 {
            responses.clear();
        }
        Self {
            responses: Mutex::new(responses),
            last: Mutex::new(last),
            delay: Duration::ZERO,
            fallback: Vec::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_fallback(mut self, fallback: Vec<RemoteItem>) -> Self {
        self.fallback = fallback;
        self
    }

    /// Replace what every later fetch returns.
    pub fn set_items(&self, items: Vec<RemoteItem>) {
        self.responses.lock().unwrap().clear();
        *self.last.lock().unwrap() = Ok(items);
    }

    pub fn set_error(&self, err: SyncError) {
        self.responses.lock().unwrap().clear();
        *self.last.lock().unwrap() = Err(err);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CollectionSource for FakeSource {
    fn name(&self) -> &str {
        "fake"
    }

    async fn fetch(&self) -> Result<Vec<RemoteItem>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let next = self.responses.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.last.lock().unwrap().clone())
    }

    fn fallback_items(&self) -> Vec<RemoteItem> {
        self.fallback.clone()
    }

    fn external_url(&self, item: &RemoteItem) -> Option<String> {
        Some(format!("https://watch.test/{}", item.payload))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeBehavior {
    Valid,
    Invalid,
    /// Never answers; only the probe timeout ends it.
    Hang,
}

/// Prober with per-item behavior that records the probe order.
pub struct FakeProber {
    behavior: Mutex<HashMap<String, ProbeBehavior>>,
    seen: Mutex<Vec<String>>,
    delay: Duration,
    stateless: bool,
}

impl FakeProber {
    pub fn new() -> Self {
        Self {
            behavior: Mutex::new(HashMap::new()),
            seen: Mutex::new(Vec::new()),
            delay: Duration::from_millis(50),
            stateless: false,
        }
    }

    pub fn stateless(mut self) -> Self {
        self.stateless = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn set(&self, id: &str, behavior: ProbeBehavior) {
        self.behavior.lock().unwrap().insert(id.to_string(), behavior);
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ItemProber for FakeProber {
    async fn probe(&self, item: &RemoteItem) -> ProbeOutcome {
        self.seen.lock().unwrap().push(item.id.clone());
        let behavior = self
            .behavior
            .lock()
            .unwrap()
            .get(&item.id)
            .copied()
            .unwrap_or(ProbeBehavior::Valid);

        tokio::time::sleep(self.delay).await;
        match behavior {
            ProbeBehavior::Valid => ProbeOutcome::Valid,
            ProbeBehavior::Invalid => ProbeOutcome::invalid("not embeddable"),
            ProbeBehavior::Hang => std::future::pending().await,
        }
    }

    fn shares_channel(&self) -> bool {
        !self.stateless
    }
}

/// Content surface whose loads can be held open per item.
#[derive(Default)]
pub struct GatedSurface {
    outcomes: Mutex<HashMap<String, LoadOutcome>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    requests: Mutex<Vec<LoadRequest>>,
    completed: Mutex<Vec<String>>,
}

impl GatedSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, id: &str, reason: &str) {
        self.outcomes.lock().unwrap().insert(
            id.to_string(),
            LoadOutcome::Failed {
                reason: reason.to_string(),
            },
        );
    }

    /// Hold loads of `id` until [`GatedSurface::release`].
    pub fn hold(&self, id: &str) {
        self.gates
            .lock()
            .unwrap()
            .insert(id.to_string(), Arc::new(Notify::new()));
    }

    pub fn release(&self, id: &str) {
        if let Some(gate) = self.gates.lock().unwrap().remove(id) {
            gate.notify_one();
        }
    }

    pub fn requested(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.item_id.clone())
            .collect()
    }

    /// Loads that ran to completion, in order.
    pub fn completed(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }

    pub async fn wait_for_request(&self, id: &str) {
        for _ in 0..1000 {
            if self.requested().iter().any(|r| r == id) {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("no load request for {id}");
    }
}

#[async_trait]
impl ContentSurface for GatedSurface {
    async fn load(&self, request: LoadRequest) -> BridgeResult<LoadOutcome> {
        self.requests.lock().unwrap().push(request.clone());
        let gate = self.gates.lock().unwrap().get(&request.item_id).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.completed.lock().unwrap().push(request.item_id.clone());
        Ok(self
            .outcomes
            .lock()
            .unwrap()
            .get(&request.item_id)
            .cloned()
            .unwrap_or(LoadOutcome::Ready))
    }
}

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2025, 4, 18, 12, 0, 0).unwrap()),
        }
    }

    pub fn advance(&self, by: ChronoDuration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

#[derive(Debug, Clone)]
enum Value {
    String(String),
    Bool(bool),
    I64(i64),
    Bytes(Bytes),
}

/// In-memory settings store.
#[derive(Default)]
pub struct MemorySettings {
    values: Mutex<HashMap<String, Value>>,
    fail_writes: Mutex<HashSet<String>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make writes to `key` fail with a storage error.
    pub fn fail_writes_to(&self, key: &str) {
        self.fail_writes.lock().unwrap().insert(key.to_string());
    }

    fn put(&self, key: &str, value: Value) -> BridgeResult<()> {
        if self.fail_writes.lock().unwrap().contains(key) {
            return Err(BridgeError::Storage(format!("write to {key} refused")));
        }
        self.values.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }

    fn read(&self, key: &str) -> Option<Value> {
        self.values.lock().unwrap().get(key).cloned()
    }
}

fn mismatch(key: &str) -> BridgeError {
    BridgeError::Storage(format!("type mismatch for {key}"))
}

#[async_trait]
impl SettingsStore for MemorySettings {
    async fn set_string(&self, key: &str, value: &str) -> BridgeResult<()> {
        self.put(key, Value::String(value.to_string()))
    }

    async fn get_string(&self, key: &str) -> BridgeResult<Option<String>> {
        match self.read(key) {
            None => Ok(None),
            Some(Value::String(v)) => Ok(Some(v)),
            Some(_) => Err(mismatch(key)),
        }
    }

    async fn set_bool(&self, key: &str, value: bool) -> BridgeResult<()> {
        self.put(key, Value::Bool(value))
    }

    async fn get_bool(&self, key: &str) -> BridgeResult<Option<bool>> {
        match self.read(key) {
            None => Ok(None),
            Some(Value::Bool(v)) => Ok(Some(v)),
            Some(_) => Err(mismatch(key)),
        }
    }

    async fn set_i64(&self, key: &str, value: i64) -> BridgeResult<()> {
        self.put(key, Value::I64(value))
    }

    async fn get_i64(&self, key: &str) -> BridgeResult<Option<i64>> {
        match self.read(key) {
            None => Ok(None),
            Some(Value::I64(v)) => Ok(Some(v)),
            Some(_) => Err(mismatch(key)),
        }
    }

    async fn set_bytes(&self, key: &str, value: Bytes) -> BridgeResult<()> {
        self.put(key, Value::Bytes(value))
    }

    async fn get_bytes(&self, key: &str) -> BridgeResult<Option<Bytes>> {
        match self.read(key) {
            None => Ok(None),
            Some(Value::Bytes(v)) => Ok(Some(v)),
            Some(_) => Err(mismatch(key)),
        }
    }

    async fn delete(&self, key: &str) -> BridgeResult<()> {
        self.values.lock().unwrap().remove(key);
        Ok(())
    }

    async fn has_key(&self, key: &str) -> BridgeResult<bool> {
        Ok(self.values.lock().unwrap().contains_key(key))
    }

    async fn list_keys(&self) -> BridgeResult<Vec<String>> {
        let mut keys: Vec<_> = self.values.lock().unwrap().keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}
