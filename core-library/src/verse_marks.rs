//! Verse highlights and bookmarks
//!
//! Highlights are a set of verse ids (`"<book>:<chapter>:<verse>"`).
//! Bookmarks are display references (`"<book> <chapter>:<verse>"`) kept in
//! the order they were added. A change is only kept in memory once it has
//! been written.

use std::collections::BTreeSet;
use std::sync::Arc;

use bridge_traits::storage::{load_json, save_json, SettingsStore};
use core_async::sync::Mutex;
use core_runtime::events::{CoreEvent, EventBus, LibraryEvent};

use crate::error::{LibraryError, Result};

pub const KEY_HIGHLIGHTS: &str = "highlightedVerses";
pub const KEY_BOOKMARKS: &str = "bookmarkedVerses";

#[derive(Debug, Default)]
struct Marks {
    highlights: BTreeSet<String>,
    bookmarks: Vec<String>,
}

pub struct VerseMarks {
    store: Arc<dyn SettingsStore>,
    events: Option<EventBus>,
    marks: Mutex<Marks>,
}

impl VerseMarks {
    pub async fn load(store: Arc<dyn SettingsStore>, events: Option<EventBus>) -> Result<Self> {
        let highlights: Vec<String> = load_json(store.as_ref(), KEY_HIGHLIGHTS)
            .await?
            .unwrap_or_default();
        let bookmarks: Vec<String> = load_json(store.as_ref(), KEY_BOOKMARKS)
            .await?
            .unwrap_or_default();

        Ok(Self {
            store,
            events,
            marks: Mutex::new(Marks {
                highlights: highlights.into_iter().collect(),
                bookmarks,
            }),
        })
    }

    fn changed(&self) {
        if let Some(events) = &self.events {
            let _ = events.emit(CoreEvent::Library(LibraryEvent::VerseMarksChanged));
        }
    }

    fn require(field: &str, value: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(LibraryError::invalid(field, "must not be empty"));
        }
        Ok(())
    }

    pub async fn highlights(&self) -> Vec<String> {
        self.marks.lock().await.highlights.iter().cloned().collect()
    }

    pub async fn is_highlighted(&self, verse_id: &str) -> bool {
        self.marks.lock().await.highlights.contains(verse_id)
    }

    /// Flip a highlight. Returns whether the verse is now highlighted.
    pub async fn toggle_highlight(&self, verse_id: &str) -> Result<bool> {
        Self::require("verse_id", verse_id)?;
        let mut marks = self.marks.lock().await;
        let mut highlights = marks.highlights.clone();
        let highlighted = if highlights.remove(verse_id) {
            false
        } else {
            highlights.insert(verse_id.to_string());
            true
        };
        save_json(self.store.as_ref(), KEY_HIGHLIGHTS, &highlights).await?;
        marks.highlights = highlights;
        drop(marks);

        self.changed();
        Ok(highlighted)
    }

    /// Highlight a verse if it is not already highlighted.
    pub async fn highlight(&self, verse_id: &str) -> Result<()> {
        Self::require("verse_id", verse_id)?;
        let mut marks = self.marks.lock().await;
        let mut highlights = marks.highlights.clone();
        if highlights.insert(verse_id.to_string()) {
            save_json(self.store.as_ref(), KEY_HIGHLIGHTS, &highlights).await?;
            marks.highlights = highlights;
            drop(marks);
            self.changed();
        }
        Ok(())
    }

    pub async fn bookmarks(&self) -> Vec<String> {
        self.marks.lock().await.bookmarks.clone()
    }

    pub async fn is_bookmarked(&self, reference: &str) -> bool {
        self.marks
            .lock()
            .await
            .bookmarks
            .iter()
            .any(|b| b == reference)
    }

    /// Add or remove a bookmark. Returns whether it is now bookmarked.
    pub async fn toggle_bookmark(&self, reference: &str) -> Result<bool> {
        Self::require("reference", reference)?;
        let mut marks = self.marks.lock().await;
        let mut bookmarks = marks.bookmarks.clone();
        let bookmarked = if bookmarks.iter().any(|b| b == reference) {
            bookmarks.retain(|b| b != reference);
            false
        } else {
            bookmarks.push(reference.to_string());
            true
        };
        save_json(self.store.as_ref(), KEY_BOOKMARKS, &bookmarks).await?;
        marks.bookmarks = bookmarks;
        drop(marks);

        self.changed();
        Ok(bookmarked)
    }

    /// Returns false when the bookmark did not exist.
    pub async fn remove_bookmark(&self, reference: &str) -> Result<bool> {
        let mut marks = self.marks.lock().await;
        let mut bookmarks = marks.bookmarks.clone();
        bookmarks.retain(|b| b != reference);
        if bookmarks.len() == marks.bookmarks.len() {
            return Ok(false);
        }
        save_json(self.store.as_ref(), KEY_BOOKMARKS, &bookmarks).await?;
        marks.bookmarks = bookmarks;
        drop(marks);

        self.changed();
        Ok(true)
    }
}

impl std::fmt::Debug for VerseMarks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerseMarks").finish_non_exhaustive()
    }
}
