//! Bookkeeping for the one in-flight selection load.

use std::sync::{Mutex, MutexGuard};

use core_async::sync::CancellationToken;

/// Handle for one selection load.
///
/// A ticket is current until a newer [`SelectionTracker::begin`] call or a
/// [`SelectionTracker::cancel`]; its token is cancelled at that point.
#[derive(Debug, Clone)]
pub struct SelectionTicket {
    generation: u64,
    item_id: String,
    token: CancellationToken,
}

impl SelectionTicket {
    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

#[derive(Debug, Default)]
struct Inner {
    generation: u64,
    current: Option<SelectionTicket>,
}

/// Tracks which selection load is current so stale completions can be
/// ignored.
#[derive(Debug, Default)]
pub struct SelectionTracker {
    inner: Mutex<Inner>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start loading `item_id`, superseding any other pending load.
    ///
    /// Returns `None` when `item_id` is already the pending load.
    pub fn begin(&self, item_id: &str) -> Option<SelectionTicket> {
        let mut inner = self.lock();
        if let Some(current) = &inner.current {
            if current.item_id == item_id {
                return None;
            }
            current.token.cancel();
        }

        inner.generation += 1;
        let ticket = SelectionTicket {
            generation: inner.generation,
            item_id: item_id.to_string(),
            token: CancellationToken::new(),
        };
        inner.current = Some(ticket.clone());
        Some(ticket)
    }

    pub fn is_current(&self, ticket: &SelectionTicket) -> bool {
        self.lock()
            .current
            .as_ref()
            .is_some_and(|current| current.generation == ticket.generation)
    }

    /// Settle `ticket`. Returns false if it was superseded in the meantime.
    pub fn finish(&self, ticket: &SelectionTicket) -> bool {
        let mut inner = self.lock();
        let is_current = inner
            .current
            .as_ref()
            .is_some_and(|current| current.generation == ticket.generation);
        if is_current {
            inner.current = None;
        }
        is_current
    }

    /// Cancel the pending load, if any.
    pub fn cancel(&self) {
        if let Some(current) = self.lock().current.take() {
            current.token.cancel();
        }
    }

    pub fn pending(&self) -> Option<String> {
        self.lock().current.as_ref().map(|t| t.item_id.clone())
    }
}
