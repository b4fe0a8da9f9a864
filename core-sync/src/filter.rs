//! Static filtering applied to every fetched collection before probing.

use std::collections::HashSet;
use std::fmt;

use crate::item::RemoteItem;

/// Title markers that identify placeholder entries for removed media.
pub const DEFAULT_DENY_MARKERS: &[&str] = &["deleted", "private", "unavailable"];

/// Why an item was rejected by [`StaticFilter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    EmptyId,
    EmptyPayload,
    DenyListed(String),
    MissingThumbnail,
    DuplicateId,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::EmptyId => write!(f, "empty id"),
            RejectReason::EmptyPayload => write!(f, "empty payload"),
            RejectReason::DenyListed(marker) => write!(f, "title contains '{}'", marker),
            RejectReason::MissingThumbnail => write!(f, "missing thumbnail"),
            RejectReason::DuplicateId => write!(f, "duplicate id"),
        }
    }
}

/// Result of [`StaticFilter::apply`].
#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    /// Surviving items in their original order
    pub kept: Vec<RemoteItem>,
    pub rejected: Vec<(RemoteItem, RejectReason)>,
}

/// Cheap, local checks that need no network.
///
/// Matching against deny markers is a case-insensitive substring test on
/// the title. Within one collection the first occurrence of an id wins.
#[derive(Debug, Clone)]
pub struct StaticFilter {
    deny_markers: Vec<String>,
    require_thumbnail: bool,
}

impl Default for StaticFilter {
    fn default() -> Self {
        Self::new(DEFAULT_DENY_MARKERS.iter().copied(), true)
    }
}

impl StaticFilter {
    pub fn new<I, S>(deny_markers: I, require_thumbnail: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            deny_markers: deny_markers
                .into_iter()
                .map(|m| m.as_ref().to_lowercase())
                .filter(|m| !m.is_empty())
                .collect(),
            require_thumbnail,
        }
    }

    /// Filter for feeds without artwork or placeholder entries.
    pub fn permissive() -> Self {
        Self::new(std::iter::empty::<&str>(), false)
    }

    pub fn with_require_thumbnail(mut self, require: bool) -> Self {
        self.require_thumbnail = require;
        self
    }

    pub fn check(&self, item: &RemoteItem) -> Option<RejectReason> {
        if item.id.trim().is_empty() {
            return Some(RejectReason::EmptyId);
        }
        if item.payload.trim().is_empty() {
            return Some(RejectReason::EmptyPayload);
        }

        let title = item.title.to_lowercase();
        if let Some(marker) = self.deny_markers.iter().find(|m| title.contains(m.as_str())) {
            return Some(RejectReason::DenyListed(marker.clone()));
        }

        let has_thumbnail = item
            .thumbnail_url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty());
        if self.require_thumbnail && !has_thumbnail {
            return Some(RejectReason::MissingThumbnail);
        }

        None
    }

    pub fn apply(&self, items: Vec<RemoteItem>) -> FilterOutcome {
        let mut outcome = FilterOutcome::default();
        let mut seen = HashSet::new();

        for item in items {
            let verdict = self.check(&item).or_else(|| {
                if seen.contains(&item.id) {
                    Some(RejectReason::DuplicateId)
                } else {
                    None
                }
            });

            match verdict {
                Some(reason) => outcome.rejected.push((item, reason)),
                None => {
                    seen.insert(item.id.clone());
                    outcome.kept.push(item);
                }
            }
        }

        outcome
    }
}
