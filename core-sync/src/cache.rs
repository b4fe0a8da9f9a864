//! Persisted cache record for one synchronizer.
//!
//! Each synchronizer owns a namespace in the settings store and is the only
//! writer of these keys:
//!
//! | Key | Value |
//! |---|---|
//! | `<ns>.items` | JSON list of the last fetched items |
//! | `<ns>.fetched_at` | unix millis of that fetch |
//! | `<ns>.valid_ids` | JSON list of ids that survived the last probe pass |
//! | `<ns>.invalid_ids` | JSON list of ids known to be unusable |
//! | `<ns>.last_checked_at` | unix millis of the last completed probe pass |

use std::collections::BTreeSet;
use std::sync::Arc;

use bridge_traits::storage::{load_json, save_json, SettingsStore};
use chrono::{DateTime, TimeZone, Utc};

use crate::error::Result;
use crate::item::RemoteItem;

/// Everything the synchronizer persists between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheRecord {
    pub items: Vec<RemoteItem>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub valid_ids: BTreeSet<String>,
    pub invalid_ids: BTreeSet<String>,
    pub last_checked_at: Option<DateTime<Utc>>,
}

impl CacheRecord {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.last_checked_at.is_none()
    }

    /// Items to show optimistically at startup.
    ///
    /// Items known to be unusable are left out. Items fetched after the last
    /// probe pass have never been checked and are kept.
    pub fn seed_items(&self) -> Vec<RemoteItem> {
        self.items
            .iter()
            .filter(|item| !self.invalid_ids.contains(&item.id))
            .cloned()
            .collect()
    }
}

/// Reads and writes a [`CacheRecord`] under a key namespace.
#[derive(Clone)]
pub struct CacheRepository {
    store: Arc<dyn SettingsStore>,
    namespace: String,
}

impl CacheRepository {
    pub fn new(store: Arc<dyn SettingsStore>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn key(&self, suffix: &str) -> String {
        format!("{}.{}", self.namespace, suffix)
    }

    pub async fn load(&self) -> Result<CacheRecord> {
        let store = self.store.as_ref();
        let items: Vec<RemoteItem> = load_json(store, &self.key("items")).await?.unwrap_or_default();
        let valid_ids: Vec<String> = load_json(store, &self.key("valid_ids"))
            .await?
            .unwrap_or_default();
        let invalid_ids: Vec<String> = load_json(store, &self.key("invalid_ids"))
            .await?
            .unwrap_or_default();
        let fetched_at = store.get_i64(&self.key("fetched_at")).await?;
        let last_checked_at = store.get_i64(&self.key("last_checked_at")).await?;

        Ok(CacheRecord {
            items,
            fetched_at: fetched_at.and_then(from_millis),
            valid_ids: valid_ids.into_iter().collect(),
            invalid_ids: invalid_ids.into_iter().collect(),
            last_checked_at: last_checked_at.and_then(from_millis),
        })
    }

    pub async fn save_items(&self, items: &[RemoteItem], fetched_at: DateTime<Utc>) -> Result<()> {
        save_json(self.store.as_ref(), &self.key("items"), items).await?;
        self.store
            .set_i64(&self.key("fetched_at"), fetched_at.timestamp_millis())
            .await?;
        Ok(())
    }

    /// Overwrite the probe results after a completed pass.
    pub async fn save_validation<'a, V, I>(
        &self,
        valid_ids: V,
        invalid_ids: I,
        checked_at: DateTime<Utc>,
    ) -> Result<()>
    where
        V: IntoIterator<Item = &'a str>,
        I: IntoIterator<Item = &'a str>,
    {
        let valid: Vec<&str> = valid_ids.into_iter().collect();
        let invalid: Vec<&str> = invalid_ids.into_iter().collect();
        save_json(self.store.as_ref(), &self.key("valid_ids"), &valid).await?;
        save_json(self.store.as_ref(), &self.key("invalid_ids"), &invalid).await?;
        self.store
            .set_i64(&self.key("last_checked_at"), checked_at.timestamp_millis())
            .await?;
        Ok(())
    }

    /// Mark one id unusable: drop it from `valid_ids` and the cached items,
    /// and add it to `invalid_ids`.
    pub async fn forget(&self, item_id: &str) -> Result<()> {
        let store = self.store.as_ref();

        let mut invalid: BTreeSet<String> = load_json(store, &self.key("invalid_ids"))
            .await?
            .unwrap_or_default();
        if invalid.insert(item_id.to_string()) {
            save_json(store, &self.key("invalid_ids"), &invalid).await?;
        }

        if let Some(mut ids) = load_json::<Vec<String>>(store, &self.key("valid_ids")).await? {
            let before = ids.len();
            ids.retain(|id| id != item_id);
            if ids.len() != before {
                save_json(store, &self.key("valid_ids"), &ids).await?;
            }
        }

        if let Some(mut items) = load_json::<Vec<RemoteItem>>(store, &self.key("items")).await? {
            let before = items.len();
            items.retain(|item| item.id != item_id);
            if items.len() != before {
                save_json(store, &self.key("items"), &items).await?;
            }
        }

        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        for suffix in ["items", "fetched_at", "valid_ids", "invalid_ids", "last_checked_at"] {
            self.store.delete(&self.key(suffix)).await?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for CacheRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheRepository")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

fn from_millis(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_desktop::SqliteSettingsStore;

    async fn repo() -> CacheRepository {
        let store = SqliteSettingsStore::in_memory().await.unwrap();
        CacheRepository::new(Arc::new(store), "worship")
    }

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).single().unwrap()
    }

    #[tokio::test]
    async fn test_empty_store_loads_default_record() {
        let record = repo().await.load().await.unwrap();
        assert!(record.is_empty());
        assert!(record.seed_items().is_empty());
    }

    #[tokio::test]
    async fn test_round_trip_and_seed() {
        let repo = repo().await;
        let items = vec![RemoteItem::new("a", "A", "a"), RemoteItem::new("b", "B", "b")];
        repo.save_items(&items, at(1_000)).await.unwrap();

        let record = repo.load().await.unwrap();
        assert_eq!(record.fetched_at, Some(at(1_000)));
        assert_eq!(record.seed_items(), items);

        repo.save_validation(["b"], ["a"], at(2_000)).await.unwrap();
        let record = repo.load().await.unwrap();
        assert_eq!(record.last_checked_at, Some(at(2_000)));
        let seeded: Vec<_> = record.seed_items().into_iter().map(|i| i.id).collect();
        assert_eq!(seeded, vec!["b"]);
    }

    #[tokio::test]
    async fn test_items_fetched_after_last_check_are_seeded() {
        let repo = repo().await;
        let first = vec![RemoteItem::new("a", "A", "a"), RemoteItem::new("b", "B", "b")];
        repo.save_items(&first, at(1_000)).await.unwrap();
        repo.save_validation(["a"], ["b"], at(2_000)).await.unwrap();

        let refetched = vec![
            RemoteItem::new("a", "A", "a"),
            RemoteItem::new("b", "B", "b"),
            RemoteItem::new("c", "C", "c"),
        ];
        repo.save_items(&refetched, at(3_000)).await.unwrap();

        let seeded: Vec<_> = repo
            .load()
            .await
            .unwrap()
            .seed_items()
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(seeded, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_forget_removes_id_everywhere() {
        let repo = repo().await;
        let items = vec![RemoteItem::new("a", "A", "a"), RemoteItem::new("b", "B", "b")];
        repo.save_items(&items, at(1_000)).await.unwrap();
        repo.save_validation(["a", "b"], std::iter::empty(), at(2_000)).await.unwrap();

        repo.forget("a").await.unwrap();

        let record = repo.load().await.unwrap();
        assert!(!record.valid_ids.contains("a"));
        assert!(record.invalid_ids.contains("a"));
        assert_eq!(record.items.len(), 1);
        assert_eq!(record.items[0].id, "b");

        // A later fetch that still lists it does not bring it back at startup.
        repo.save_items(&items, at(3_000)).await.unwrap();
        let seeded: Vec<_> = repo
            .load()
            .await
            .unwrap()
            .seed_items()
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(seeded, vec!["b"]);
    }

    #[tokio::test]
    async fn test_namespaces_are_isolated() {
        let store: Arc<dyn SettingsStore> = Arc::new(SqliteSettingsStore::in_memory().await.unwrap());
        let worship = CacheRepository::new(store.clone(), "worship");
        let news = CacheRepository::new(store.clone(), "announcements");

        worship
            .save_items(&[RemoteItem::new("a", "A", "a")], at(1))
            .await
            .unwrap();

        assert!(news.load().await.unwrap().is_empty());
        assert!(store.has_key("worship.items").await.unwrap());

        worship.clear().await.unwrap();
        assert!(!store.has_key("worship.items").await.unwrap());
    }
}
