//! Domain models for local records
//!
//! Notes and folders are persisted as whole JSON lists, so these types are
//! also the storage format.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// =============================================================================
// ID Types
// =============================================================================

/// Unique identifier for a note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(pub Uuid);

impl NoteId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for NoteId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FolderId(pub Uuid);

impl FolderId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for FolderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Notes
// =============================================================================

/// A free-form note, optionally filed under a folder by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub text: String,
    /// Name of the folder this note is filed under
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default)]
    pub category: i64,
    /// Unix millis
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

impl Note {
    pub fn new(title: String, text: String, folder: Option<String>, now: i64) -> Self {
        Self {
            id: NoteId::new(),
            title,
            text,
            folder,
            category: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Validate note data
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() && self.text.trim().is_empty() {
            return Err("Note must have a title or text".to_string());
        }
        Ok(())
    }

    /// Case-insensitive match against title and text.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty()
            || self.title.to_lowercase().contains(&query)
            || self.text.to_lowercase().contains(&query)
    }

    /// First line of the text, cut to `max_chars`.
    pub fn preview(&self, max_chars: usize) -> String {
        let first_line = self.text.lines().next().unwrap_or_default().trim();
        if first_line.chars().count() <= max_chars {
            return first_line.to_string();
        }
        let cut: String = first_line.chars().take(max_chars).collect();
        format!("{}...", cut.trim_end())
    }
}

/// A named group of notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: FolderId,
    pub name: String,
    #[serde(default)]
    pub created_at: i64,
}

impl Folder {
    pub fn new(name: String, now: i64) -> Self {
        Self {
            id: FolderId::new(),
            name,
            created_at: now,
        }
    }

    /// Validate folder data
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Folder name cannot be empty".to_string());
        }
        Ok(())
    }

    /// Names compare trimmed and case-insensitively.
    pub fn same_name(&self, name: &str) -> bool {
        self.name.trim().to_lowercase() == name.trim().to_lowercase()
    }
}
