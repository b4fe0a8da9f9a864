//! Key-Value Settings Abstraction
//!
//! Durable key-value persistence used for preferences, local records and
//! synchronizer cache records.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::{BridgeError, Result};

/// Settings storage trait
///
/// Abstracts persistent key-value storage:
/// - Desktop: SQLite table
/// - iOS: UserDefaults
/// - Android: SharedPreferences / DataStore
///
/// Values are typed; reading a key with the wrong accessor is an error, not
/// a silent conversion. Byte values carry opaque blobs such as JSON-encoded
/// lists that are rewritten wholesale on every mutation.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::SettingsStore;
///
/// async fn save_preference(store: &dyn SettingsStore) -> Result<()> {
///     store.set_string("selectedFontSize", "medium").await?;
///     store.set_bool("enableBackgroundMusic", true).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Store a string value
    async fn set_string(&self, key: &str, value: &str) -> Result<()>;

    /// Retrieve a string value
    async fn get_string(&self, key: &str) -> Result<Option<String>>;

    /// Store a boolean value
    async fn set_bool(&self, key: &str, value: bool) -> Result<()>;

    /// Retrieve a boolean value
    async fn get_bool(&self, key: &str) -> Result<Option<bool>>;

    /// Store an integer value
    async fn set_i64(&self, key: &str, value: i64) -> Result<()>;

    /// Retrieve an integer value
    async fn get_i64(&self, key: &str) -> Result<Option<i64>>;

    /// Store an opaque byte value
    async fn set_bytes(&self, key: &str, value: Bytes) -> Result<()>;

    /// Retrieve an opaque byte value
    async fn get_bytes(&self, key: &str) -> Result<Option<Bytes>>;

    /// Delete a setting. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if a setting exists
    async fn has_key(&self, key: &str) -> Result<bool>;

    /// List all setting keys
    async fn list_keys(&self) -> Result<Vec<String>>;
}

/// Serialize `value` as JSON and store it as bytes under `key`.
pub async fn save_json<T>(store: &dyn SettingsStore, key: &str, value: &T) -> Result<()>
where
    T: Serialize + ?Sized + Sync,
{
    let encoded = serde_json::to_vec(value).map_err(|e| {
        BridgeError::Storage(format!("Failed to encode value for '{}': {}", key, e))
    })?;
    store.set_bytes(key, Bytes::from(encoded)).await
}

/// Load and decode a JSON value stored with [`save_json`].
///
/// Returns `Ok(None)` when the key is absent. A present but undecodable
/// value is reported as [`BridgeError::Storage`].
pub async fn load_json<T>(store: &dyn SettingsStore, key: &str) -> Result<Option<T>>
where
    T: DeserializeOwned,
{
    match store.get_bytes(key).await? {
        Some(bytes) => serde_json::from_slice(&bytes).map(Some).map_err(|e| {
            BridgeError::Storage(format!("Stored value for '{}' is not valid: {}", key, e))
        }),
        None => Ok(None),
    }
}
