//! # Event Bus System
//!
//! Decoupled notifications between core modules over a broadcast channel.
//!
//! ## Overview
//!
//! - **Event Types**: [`ContentEvent`] for remote feeds and [`LibraryEvent`]
//!   for local records, wrapped in [`CoreEvent`]
//! - **EventBus**: the broadcast sender shared by every module
//! - **EventStream**: a receiver with optional filtering
//!
//! Reactive UI state does not travel over the bus; each synchronizer exposes
//! its own watch channel. The bus is for hosts that want a log of what
//! happened (analytics, toasts, diagnostics).
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{ContentEvent, CoreEvent, EventBus};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(16);
//! let mut subscriber = bus.subscribe();
//!
//! bus.emit(CoreEvent::Content(ContentEvent::FetchStarted {
//!     feed: "worship".to_string(),
//! }))
//! .ok();
//!
//! let event = subscriber.recv().await.unwrap();
//! assert_eq!(event.description(), "Fetch started");
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber missed `n` events; it can keep reading.
//! - **`RecvError::Closed`**: every sender was dropped; treat as shutdown.
//!
//! Emitting with no subscribers returns an error that publishers ignore.

use core_async::sync::broadcast;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use core_async::sync::broadcast::error::{RecvError, SendError};
pub use core_async::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Remote feed synchronization events
    Content(ContentEvent),
    /// Local record events
    Library(LibraryEvent),
}

impl CoreEvent {
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Content(e) => e.description(),
            CoreEvent::Library(e) => e.description(),
        }
    }

    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Content(ContentEvent::FetchFailed { .. }) => EventSeverity::Error,
            CoreEvent::Content(ContentEvent::PlaybackFailed { .. }) => EventSeverity::Warning,
            CoreEvent::Content(ContentEvent::FetchRetrying { .. }) => EventSeverity::Warning,
            CoreEvent::Content(ContentEvent::ProbePassCompleted { surviving: 0, .. }) => {
                EventSeverity::Error
            }
            CoreEvent::Content(ContentEvent::FetchCompleted { .. })
            | CoreEvent::Content(ContentEvent::ProbePassCompleted { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

/// Events emitted by remote list synchronizers.
///
/// `feed` is the synchronizer's namespace, e.g. `"worship"` or `"announcements"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum ContentEvent {
    FetchStarted {
        feed: String,
    },
    /// A transient failure will be retried after the fixed delay.
    FetchRetrying {
        feed: String,
        attempt: u32,
        max_attempts: u32,
        reason: String,
    },
    FetchCompleted {
        feed: String,
        item_count: usize,
        rejected_count: usize,
    },
    FetchFailed {
        feed: String,
        message: String,
    },
    ProbePassStarted {
        feed: String,
        item_count: usize,
    },
    ProbePassCompleted {
        feed: String,
        surviving: usize,
        dropped: usize,
    },
    ItemRemoved {
        feed: String,
        item_id: String,
    },
    SelectionChanged {
        feed: String,
        item_id: Option<String>,
    },
    /// The selected item failed after it was presented.
    PlaybackFailed {
        feed: String,
        item_id: String,
        reason: String,
    },
}

impl ContentEvent {
    pub fn description(&self) -> &str {
        match self {
            ContentEvent::FetchStarted { .. } => "Fetch started",
            ContentEvent::FetchRetrying { .. } => "Fetch retrying",
            ContentEvent::FetchCompleted { .. } => "Fetch completed",
            ContentEvent::FetchFailed { .. } => "Fetch failed",
            ContentEvent::ProbePassStarted { .. } => "Probe pass started",
            ContentEvent::ProbePassCompleted { .. } => "Probe pass completed",
            ContentEvent::ItemRemoved { .. } => "Item removed",
            ContentEvent::SelectionChanged { .. } => "Selection changed",
            ContentEvent::PlaybackFailed { .. } => "Playback failed",
        }
    }

    /// Namespace of the synchronizer that emitted the event.
    pub fn feed(&self) -> &str {
        match self {
            ContentEvent::FetchStarted { feed }
            | ContentEvent::FetchRetrying { feed, .. }
            | ContentEvent::FetchCompleted { feed, .. }
            | ContentEvent::FetchFailed { feed, .. }
            | ContentEvent::ProbePassStarted { feed, .. }
            | ContentEvent::ProbePassCompleted { feed, .. }
            | ContentEvent::ItemRemoved { feed, .. }
            | ContentEvent::SelectionChanged { feed, .. }
            | ContentEvent::PlaybackFailed { feed, .. } => feed,
        }
    }
}

/// Events emitted by local record stores.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum LibraryEvent {
    NoteSaved { note_id: String },
    NoteDeleted { note_id: String },
    FolderCreated { folder_id: String, name: String },
    FolderRenamed { folder_id: String, name: String },
    FolderDeleted { folder_id: String },
    PreferenceChanged { key: String },
    VerseMarksChanged,
}

impl LibraryEvent {
    pub fn description(&self) -> &str {
        match self {
            LibraryEvent::NoteSaved { .. } => "Note saved",
            LibraryEvent::NoteDeleted { .. } => "Note deleted",
            LibraryEvent::FolderCreated { .. } => "Folder created",
            LibraryEvent::FolderRenamed { .. } => "Folder renamed",
            LibraryEvent::FolderDeleted { .. } => "Folder deleted",
            LibraryEvent::PreferenceChanged { .. } => "Preference changed",
            LibraryEvent::VerseMarksChanged => "Verse marks changed",
        }
    }
}

/// Central event bus.
///
/// Cloning is cheap; every clone publishes into the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified per-subscriber buffer.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error when nobody is listening.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let bus = EventBus::default();
/// let content_only = EventStream::new(bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Content(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` are returned by `recv`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn matches(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.matches(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive a matching event without waiting.
    ///
    /// Returns `None` if no matching event is currently buffered.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.matches(&event) => return Some(Ok(event)),
                Ok(_) => continue,
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}
