//! Settings store whose writes can be switched off.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bridge_desktop::SqliteSettingsStore;
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::storage::SettingsStore;
use bytes::Bytes;

pub struct FlakyStore {
    inner: SqliteSettingsStore,
    failing: AtomicBool,
}

impl FlakyStore {
    pub async fn new() -> Self {
        Self {
            inner: SqliteSettingsStore::in_memory().await.unwrap(),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self, key: &str) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(BridgeError::Storage(format!("disk full writing {key}")));
        }
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for FlakyStore {
    async fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.check(key)?;
        self.inner.set_string(key, value).await
    }

    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        self.inner.get_string(key).await
    }

    async fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        self.check(key)?;
        self.inner.set_bool(key, value).await
    }

    async fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        self.inner.get_bool(key).await
    }

    async fn set_i64(&self, key: &str, value: i64) -> Result<()> {
        self.check(key)?;
        self.inner.set_i64(key, value).await
    }

    async fn get_i64(&self, key: &str) -> Result<Option<i64>> {
        self.inner.get_i64(key).await
    }

    async fn set_bytes(&self, key: &str, value: Bytes) -> Result<()> {
        self.check(key)?;
        self.inner.set_bytes(key, value).await
    }

    async fn get_bytes(&self, key: &str) -> Result<Option<Bytes>> {
        self.inner.get_bytes(key).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.check(key)?;
        self.inner.delete(key).await
    }

    async fn has_key(&self, key: &str) -> Result<bool> {
        self.inner.has_key(key).await
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        self.inner.list_keys().await
    }
}
