//! Notes and folders
//!
//! The whole collection is held in memory and rewritten to the settings
//! store after every mutation, under `savedNotes` and `savedFolders`.
//! Notes reference folders by name, so renaming a folder re-labels its notes
//! and deleting one leaves them unfiled.
//!
//! Mutations are applied to a copy of the records and only become visible
//! once the copy has been written, so a failed write leaves the repository
//! as it was.

use std::sync::Arc;

use bridge_traits::storage::{load_json, save_json, SettingsStore};
use bridge_traits::time::{Clock, SystemClock};
use core_async::sync::Mutex;
use core_runtime::events::{CoreEvent, EventBus, LibraryEvent};
use tracing::{debug, info, instrument, warn};

use crate::error::{LibraryError, Result};
use crate::models::{Folder, FolderId, Note, NoteId};

pub const KEY_NOTES: &str = "savedNotes";
pub const KEY_FOLDERS: &str = "savedFolders";

#[derive(Debug, Clone, Default)]
struct Records {
    notes: Vec<Note>,
    folders: Vec<Folder>,
}

/// Fields of a note that can be edited.
#[derive(Debug, Clone, Default)]
pub struct NoteDraft {
    pub title: String,
    pub text: String,
    pub folder: Option<String>,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            folder: None,
        }
    }

    pub fn in_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = Some(folder.into());
        self
    }
}

/// Repository for notes and folders.
pub struct NotesRepository {
    store: Arc<dyn SettingsStore>,
    clock: Arc<dyn Clock>,
    events: Option<EventBus>,
    records: Mutex<Records>,
}

impl NotesRepository {
    /// Load notes and folders from the store.
    pub async fn load(store: Arc<dyn SettingsStore>) -> Result<Self> {
        Self::load_with(store, Arc::new(SystemClock), None).await
    }

    pub async fn load_with(
        store: Arc<dyn SettingsStore>,
        clock: Arc<dyn Clock>,
        events: Option<EventBus>,
    ) -> Result<Self> {
        let notes: Vec<Note> = load_json(store.as_ref(), KEY_NOTES).await?.unwrap_or_default();
        let folders: Vec<Folder> = load_json(store.as_ref(), KEY_FOLDERS)
            .await?
            .unwrap_or_default();
        debug!(notes = notes.len(), folders = folders.len(), "Loaded notes");

        Ok(Self {
            store,
            clock,
            events,
            records: Mutex::new(Records { notes, folders }),
        })
    }

    fn emit(&self, event: LibraryEvent) {
        if let Some(events) = &self.events {
            let _ = events.emit(CoreEvent::Library(event));
        }
    }

    /// Write the parts of `next` that differ from `current`, then make it
    /// current.
    ///
    /// When the notes write fails after the folders were written, the old
    /// folder list is written back so the stored pair stays consistent.
    async fn commit(&self, current: &mut Records, next: Records) -> Result<()> {
        let store = self.store.as_ref();
        let folders_changed = next.folders != current.folders;

        if folders_changed {
            save_json(store, KEY_FOLDERS, &next.folders).await?;
        }
        if next.notes != current.notes {
            if let Err(e) = save_json(store, KEY_NOTES, &next.notes).await {
                if folders_changed {
                    if let Err(undo) = save_json(store, KEY_FOLDERS, &current.folders).await {
                        warn!(error = %undo, "Failed to restore folders after notes write failed");
                    }
                }
                return Err(e.into());
            }
        }

        *current = next;
        Ok(())
    }

    fn check_folder(records: &Records, folder: Option<&str>) -> Result<()> {
        match folder {
            Some(name) if !records.folders.iter().any(|f| f.same_name(name)) => {
                Err(LibraryError::not_found("Folder", name))
            }
            _ => Ok(()),
        }
    }

    // ------------------------------------------------------------------
    // Notes
    // ------------------------------------------------------------------

    pub async fn notes(&self) -> Vec<Note> {
        self.records.lock().await.notes.clone()
    }

    pub async fn get(&self, id: NoteId) -> Option<Note> {
        self.records
            .lock()
            .await
            .notes
            .iter()
            .find(|n| n.id == id)
            .cloned()
    }

    /// Notes filed under `folder`, or unfiled notes for `None`.
    pub async fn notes_in_folder(&self, folder: Option<&str>) -> Vec<Note> {
        self.records
            .lock()
            .await
            .notes
            .iter()
            .filter(|n| match (folder, n.folder.as_deref()) {
                (None, None) => true,
                (Some(wanted), Some(actual)) => {
                    wanted.trim().eq_ignore_ascii_case(actual.trim())
                }
                _ => false,
            })
            .cloned()
            .collect()
    }

    pub async fn search(&self, query: &str) -> Vec<Note> {
        self.records
            .lock()
            .await
            .notes
            .iter()
            .filter(|n| n.matches(query))
            .cloned()
            .collect()
    }

    #[instrument(skip(self, draft))]
    pub async fn create(&self, draft: NoteDraft) -> Result<Note> {
        let mut records = self.records.lock().await;
        Self::check_folder(&records, draft.folder.as_deref())?;

        let note = Note::new(
            draft.title,
            draft.text,
            draft.folder,
            self.clock.unix_timestamp_millis(),
        );
        note.validate()
            .map_err(|msg| LibraryError::invalid("Note", msg))?;

        let mut next = records.clone();
        next.notes.push(note.clone());
        self.commit(&mut records, next).await?;
        drop(records);

        info!(note_id = %note.id, "Note created");
        self.emit(LibraryEvent::NoteSaved {
            note_id: note.id.to_string(),
        });
        Ok(note)
    }

    #[instrument(skip(self, draft))]
    pub async fn update(&self, id: NoteId, draft: NoteDraft) -> Result<Note> {
        let mut records = self.records.lock().await;
        Self::check_folder(&records, draft.folder.as_deref())?;
        let now = self.clock.unix_timestamp_millis();

        let mut next = records.clone();
        let note = next
            .notes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| LibraryError::not_found("Note", id))?;

        let mut updated = note.clone();
        updated.title = draft.title;
        updated.text = draft.text;
        updated.folder = draft.folder;
        updated.updated_at = now;
        updated
            .validate()
            .map_err(|msg| LibraryError::invalid("Note", msg))?;
        *note = updated.clone();

        self.commit(&mut records, next).await?;
        drop(records);

        self.emit(LibraryEvent::NoteSaved {
            note_id: id.to_string(),
        });
        Ok(updated)
    }

    /// Returns false when no note had `id`.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: NoteId) -> Result<bool> {
        let mut records = self.records.lock().await;
        let mut next = records.clone();
        next.notes.retain(|n| n.id != id);
        if next.notes.len() == records.notes.len() {
            return Ok(false);
        }

        self.commit(&mut records, next).await?;
        drop(records);

        self.emit(LibraryEvent::NoteDeleted {
            note_id: id.to_string(),
        });
        Ok(true)
    }

    /// File a note under `folder`, or unfile it with `None`.
    #[instrument(skip(self))]
    pub async fn move_to_folder(&self, id: NoteId, folder: Option<&str>) -> Result<Note> {
        let mut records = self.records.lock().await;
        Self::check_folder(&records, folder)?;

        // Store the folder's canonical spelling.
        let folder = folder.and_then(|name| {
            records
                .folders
                .iter()
                .find(|f| f.same_name(name))
                .map(|f| f.name.clone())
        });
        let now = self.clock.unix_timestamp_millis();

        let mut next = records.clone();
        let note = next
            .notes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| LibraryError::not_found("Note", id))?;
        note.folder = folder;
        note.updated_at = now;
        let moved = note.clone();

        self.commit(&mut records, next).await?;
        drop(records);

        self.emit(LibraryEvent::NoteSaved {
            note_id: id.to_string(),
        });
        Ok(moved)
    }

    // ------------------------------------------------------------------
    // Folders
    // ------------------------------------------------------------------

    pub async fn folders(&self) -> Vec<Folder> {
        self.records.lock().await.folders.clone()
    }

    #[instrument(skip(self))]
    pub async fn add_folder(&self, name: &str) -> Result<Folder> {
        let mut records = self.records.lock().await;
        let folder = Folder::new(name.trim().to_string(), self.clock.unix_timestamp_millis());
        folder
            .validate()
            .map_err(|msg| LibraryError::invalid("Folder", msg))?;
        if records.folders.iter().any(|f| f.same_name(name)) {
            return Err(LibraryError::Duplicate {
                entity_type: "folder".to_string(),
                name: folder.name,
            });
        }

        let mut next = records.clone();
        next.folders.push(folder.clone());
        self.commit(&mut records, next).await?;
        drop(records);

        self.emit(LibraryEvent::FolderCreated {
            folder_id: folder.id.to_string(),
            name: folder.name.clone(),
        });
        Ok(folder)
    }

    /// Rename a folder and re-label the notes filed under it.
    #[instrument(skip(self))]
    pub async fn rename_folder(&self, id: FolderId, name: &str) -> Result<Folder> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(LibraryError::invalid("Folder", "Folder name cannot be empty"));
        }

        let mut records = self.records.lock().await;
        if records
            .folders
            .iter()
            .any(|f| f.id != id && f.same_name(&name))
        {
            return Err(LibraryError::Duplicate {
                entity_type: "folder".to_string(),
                name,
            });
        }

        let mut next = records.clone();
        let folder = next
            .folders
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| LibraryError::not_found("Folder", id))?;
        let old_name = std::mem::replace(&mut folder.name, name.clone());
        let renamed = folder.clone();

        let mut relabelled = 0;
        for note in next.notes.iter_mut() {
            if note.folder.as_deref() == Some(old_name.as_str()) {
                note.folder = Some(name.clone());
                relabelled += 1;
            }
        }

        self.commit(&mut records, next).await?;
        drop(records);

        debug!(relabelled, "Folder renamed");
        self.emit(LibraryEvent::FolderRenamed {
            folder_id: id.to_string(),
            name,
        });
        Ok(renamed)
    }

    /// Delete a folder. Its notes are kept and become unfiled.
    #[instrument(skip(self))]
    pub async fn delete_folder(&self, id: FolderId) -> Result<bool> {
        let mut records = self.records.lock().await;
        let Some(index) = records.folders.iter().position(|f| f.id == id) else {
            return Ok(false);
        };
        let mut next = records.clone();
        let folder = next.folders.remove(index);

        for note in next.notes.iter_mut() {
            if note.folder.as_deref() == Some(folder.name.as_str()) {
                note.folder = None;
            }
        }

        self.commit(&mut records, next).await?;
        drop(records);

        debug!(folder = %folder.name, "Folder deleted");
        self.emit(LibraryEvent::FolderDeleted {
            folder_id: id.to_string(),
        });
        Ok(true)
    }
}

impl std::fmt::Debug for NotesRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotesRepository").finish_non_exhaustive()
    }
}
