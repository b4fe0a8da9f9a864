//! Collection sources: where a synchronizer gets its items from.

use async_trait::async_trait;

use crate::error::Result;
use crate::item::RemoteItem;

/// A remote collection endpoint plus its decoder.
///
/// `fetch` performs a single attempt and classifies failures through
/// [`SyncError`](crate::SyncError); retrying is the synchronizer's job.
///
/// ```ignore
/// struct StaticSource(Vec<RemoteItem>);
///
/// #[async_trait]
/// impl CollectionSource for StaticSource {
///     fn name(&self) -> &str { "static" }
///     async fn fetch(&self) -> Result<Vec<RemoteItem>> { Ok(self.0.clone()) }
/// }
/// ```
#[async_trait]
pub trait CollectionSource: Send + Sync {
    /// Short label used in logs and events.
    fn name(&self) -> &str;

    /// Fetch and decode the full collection, in display order.
    async fn fetch(&self) -> Result<Vec<RemoteItem>>;

    /// Items shown when a fetch fails and nothing else is available.
    fn fallback_items(&self) -> Vec<RemoteItem> {
        Vec::new()
    }

    /// URL for opening an item outside the app, if the source has one.
    fn external_url(&self, _item: &RemoteItem) -> Option<String> {
        None
    }
}
