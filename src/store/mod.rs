//! Persistence layer: key-value storage for the session's collections.
//!
//! Storage failures never propagate past this module's helpers: a failed
//! load yields `None` and a failed write is logged and dropped.

pub mod libsql_backend;
pub mod memory;
pub mod traits;

pub use libsql_backend::LibSqlStore;
pub use memory::MemoryStore;
pub use traits::{KeyValueStore, keys};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StorageError;

/// Load and decode the blob under `key`. Missing, unreadable or malformed
/// values all come back as `None`.
pub async fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(key = key, "Failed to read from store: {}", e);
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key = key, "Discarding malformed stored value: {}", e);
            None
        }
    }
}

/// Encode `value` and write it under `key`, logging instead of failing.
pub async fn persist_json<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) {
    if let Err(e) = try_persist_json(store, key, value).await {
        tracing::warn!(key = key, "Failed to persist: {}", e);
    }
}

async fn try_persist_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let encoded = serde_json::to_string(value)?;
    store.set(key, &encoded).await
}
