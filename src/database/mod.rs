//! Key-value persistence
//!
//! Every component persists through [`KvStore`]: atomic get/put/delete on
//! opaque string keys with optional expiry, and no transactions across keys.
//! Structured documents are stored as JSON text via [`get_json`]/[`put_json`].

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::errors::StoreResult;
use crate::utils::Clock;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryKvStore;
pub use sqlite::SqliteKvStore;

#[async_trait]
pub trait KvStore: Send + Sync {
    /// Fetch a value. Expired entries read as absent.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Insert or overwrite a value, optionally expiring after `ttl`.
    async fn put(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()>;

    /// Remove a value. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Drop every expired entry, returning how many were removed.
    async fn purge_expired(&self) -> StoreResult<u64> {
        Ok(0)
    }
}

pub type SharedStore = Arc<dyn KvStore>;

/// Read and decode a JSON document
pub async fn get_json<T: DeserializeOwned>(store: &dyn KvStore, key: &str) -> StoreResult<Option<T>> {
    match store.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Encode and write a JSON document
pub async fn put_json<T: Serialize + ?Sized>(
    store: &dyn KvStore,
    key: &str,
    value: &T,
    ttl: Option<Duration>,
) -> StoreResult<()> {
    let raw = serde_json::to_string(value)?;
    store.put(key, &raw, ttl).await
}

/// Open the store selected by `database.url`
pub async fn open_store(config: &Config, clock: Arc<dyn Clock>) -> anyhow::Result<SharedStore> {
    if config.uses_memory_store() {
        tracing::warn!("Using in-memory store; catalog and sessions are lost on restart");
        return Ok(Arc::new(MemoryKvStore::new(clock)));
    }

    let store = SqliteKvStore::connect(&config.database, clock).await?;
    store.migrate().await?;
    Ok(Arc::new(store))
}
