//! Remote items and per-pass validation bookkeeping.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One entry of a remote collection.
///
/// `id` is unique within a fetch and stable across fetches. `payload` is the
/// opaque reference handed to probers and the content surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteItem {
    pub id: String,
    pub title: String,
    pub payload: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl RemoteItem {
    pub fn new(id: impl Into<String>, title: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            payload: payload.into(),
            thumbnail_url: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail_url = Some(url.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}

/// Validation state of one item during a probe pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationState {
    Unchecked,
    Checking,
    Valid,
    Invalid,
}

impl ValidationState {
    fn can_transition_to(self, next: ValidationState) -> bool {
        matches!(
            (self, next),
            (ValidationState::Unchecked, ValidationState::Checking)
                | (ValidationState::Checking, ValidationState::Valid)
                | (ValidationState::Checking, ValidationState::Invalid)
        )
    }
}

/// Per-pass validation states, created fresh for each pass.
#[derive(Debug, Clone, Default)]
pub struct ValidationLedger {
    states: HashMap<String, ValidationState>,
}

impl ValidationLedger {
    /// Start a pass with every item `Unchecked`.
    pub fn new<'a>(ids: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            states: ids
                .into_iter()
                .map(|id| (id.to_string(), ValidationState::Unchecked))
                .collect(),
        }
    }

    pub fn state(&self, id: &str) -> Option<ValidationState> {
        self.states.get(id).copied()
    }

    /// Apply a transition. Illegal transitions are rejected and leave the
    /// state untouched.
    pub fn advance(&mut self, id: &str, next: ValidationState) -> bool {
        match self.states.get_mut(id) {
            Some(current) if current.can_transition_to(next) => {
                *current = next;
                true
            }
            _ => false,
        }
    }

    pub fn count(&self, state: ValidationState) -> usize {
        self.states.values().filter(|s| **s == state).count()
    }

    /// True once every item has reached `Valid` or `Invalid`.
    pub fn is_settled(&self) -> bool {
        self.states
            .values()
            .all(|s| matches!(s, ValidationState::Valid | ValidationState::Invalid))
    }
}
