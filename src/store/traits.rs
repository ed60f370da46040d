//! `KeyValueStore` trait: the single async persistence seam.
//!
//! Every collection the session owns is mirrored as one JSON blob under a
//! fixed key. There is no batching across keys.

use async_trait::async_trait;

use crate::error::StorageError;

/// Backend-agnostic string key-value store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Overwrite the value stored under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Storage keys, one per persisted collection.
pub mod keys {
    /// Per-group message logs, `{ groupId: [Message] }`.
    pub const MESSAGES: &str = "messages";
    /// The user's group collection, `[Group]`.
    pub const GROUPS: &str = "groups";
    /// Selected and custom interests, `{ selected: [..], custom: [..] }`.
    pub const INTERESTS: &str = "interests";
    /// Location snapshot and travel radius, `{ location, radius }`.
    pub const LOCATION_DATA: &str = "locationData";
}
