//! The passage currently open in the reader, as a synchronized collection.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use core_sync::{CollectionSource, RemoteItem};
use tracing::info;

use crate::client::BibleClient;
use crate::reference::Reference;
use crate::types::Verse;

pub const META_VERSE: &str = "verse";
pub const META_LABEL: &str = "label";

/// Item id is the verse id, title the display label and payload the text.
pub fn verse_item(verse: &Verse) -> RemoteItem {
    RemoteItem::new(verse.id(), verse.label(), verse.clean_text())
        .with_metadata(META_VERSE, verse.verse.to_string())
        .with_metadata(META_LABEL, verse.label())
}

/// Serves the verses of the current passage. Call `set_passage` and then
/// refresh the synchronizer to switch chapters.
pub struct PassageSource {
    client: Arc<BibleClient>,
    current: RwLock<Reference>,
}

impl PassageSource {
    pub fn new(client: Arc<BibleClient>, initial: Reference) -> Self {
        Self {
            client,
            current: RwLock::new(initial),
        }
    }

    pub fn passage(&self) -> Reference {
        match self.current.read() {
            Ok(current) => current.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Returns the previous passage.
    pub fn set_passage(&self, reference: Reference) -> Reference {
        info!(reference = %reference, "Switching passage");
        let mut current = match self.current.write() {
            Ok(current) => current,
            Err(poisoned) => poisoned.into_inner(),
        };
        std::mem::replace(&mut *current, reference)
    }

    /// Id of the requested verse within the current passage, if one was given.
    pub fn focused_verse_id(&self, items: &[RemoteItem]) -> Option<String> {
        let verse = self.passage().verse?.to_string();
        items
            .iter()
            .find(|item| item.metadata_value(META_VERSE) == Some(verse.as_str()))
            .map(|item| item.id.clone())
    }
}

#[async_trait]
impl CollectionSource for PassageSource {
    fn name(&self) -> &str {
        "bible"
    }

    async fn fetch(&self) -> core_sync::Result<Vec<RemoteItem>> {
        let reference = self.passage();
        let verses = self.client.fetch_passage(&reference).await?;
        Ok(verses.iter().map(verse_item).collect())
    }
}
