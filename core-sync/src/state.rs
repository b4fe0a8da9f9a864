//! Consumer-facing synchronizer state.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{ErrorKind, SyncError};
use crate::item::RemoteItem;

/// Error shown to the consumer alongside the item list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateError {
    pub kind: ErrorKind,
    pub message: String,
}

impl StateError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<&SyncError> for StateError {
    fn from(err: &SyncError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

/// Snapshot published on every mutation.
///
/// `selected` is always `None` or the id of an entry in `items`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncState {
    pub items: Vec<RemoteItem>,
    pub selected: Option<String>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub is_loading: bool,
    pub is_validating: bool,
    pub error: Option<StateError>,
    pub is_loading_selection: bool,
    pub has_playback_error: bool,
}

impl SyncState {
    pub fn contains(&self, item_id: &str) -> bool {
        self.items.iter().any(|item| item.id == item_id)
    }

    pub fn item(&self, item_id: &str) -> Option<&RemoteItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    pub fn selected_item(&self) -> Option<&RemoteItem> {
        self.selected.as_deref().and_then(|id| self.item(id))
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Move a selection that no longer names an item to the first item, or
    /// clear it. Returns true when `selected` changed.
    pub fn reconcile_selection(&mut self) -> bool {
        match &self.selected {
            Some(id) if !self.contains(id) => {
                self.selected = self.items.first().map(|item| item.id.clone());
                self.is_loading_selection = false;
                true
            }
            _ => false,
        }
    }

    /// Select the first item when nothing is selected.
    pub fn select_first_if_unset(&mut self) -> bool {
        if self.selected.is_some() {
            return false;
        }
        self.selected = self.items.first().map(|item| item.id.clone());
        self.selected.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(ids: &[&str], selected: Option<&str>) -> SyncState {
        SyncState {
            items: ids.iter().map(|id| RemoteItem::new(*id, *id, *id)).collect(),
            selected: selected.map(str::to_string),
            ..SyncState::default()
        }
    }

    #[test]
    fn test_reconcile_moves_to_first_survivor() {
        let mut s = state(&["b", "c"], Some("a"));
        assert!(s.reconcile_selection());
        assert_eq!(s.selected.as_deref(), Some("b"));
    }

    #[test]
    fn test_reconcile_clears_when_empty() {
        let mut s = state(&[], Some("a"));
        assert!(s.reconcile_selection());
        assert_eq!(s.selected, None);
    }

    #[test]
    fn test_reconcile_keeps_valid_selection() {
        let mut s = state(&["a", "b"], Some("b"));
        assert!(!s.reconcile_selection());
        assert_eq!(s.selected_item().map(|i| i.id.as_str()), Some("b"));
    }

    #[test]
    fn test_select_first_if_unset() {
        let mut s = state(&["a", "b"], None);
        assert!(s.select_first_if_unset());
        assert_eq!(s.selected.as_deref(), Some("a"));
        assert!(!s.select_first_if_unset());
    }

    #[test]
    fn test_state_error_from_sync_error() {
        let err = StateError::from(&SyncError::HttpStatus { status: 403 });
        assert_eq!(err.kind, ErrorKind::HttpStatus);
        assert_eq!(err.message, "HTTP status 403");
    }
}
