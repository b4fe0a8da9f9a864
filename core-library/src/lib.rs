//! # Local Records
//!
//! Data the app keeps on the device, persisted through the host
//! `SettingsStore`.
//!
//! ## Overview
//!
//! This module manages:
//! - Typed user preferences (`preferences`)
//! - Notes and note folders (`notes`)
//! - Verse highlights and bookmarks (`verse_marks`)
//!
//! Collections are small and rewritten wholesale on every mutation.

pub mod error;
pub mod models;
pub mod notes;
pub mod preferences;
pub mod verse_marks;

#[cfg(test)]
mod test_support;

pub use error::{LibraryError, Result};
pub use models::{Folder, FolderId, Note, NoteId};
pub use notes::{NoteDraft, NotesRepository};
pub use preferences::{
    BackgroundGradient, FontSize, NoteColor, Preferences, PreferencesStore, RefreshFrequency,
    ScriptureTheme,
};
pub use verse_marks::VerseMarks;
