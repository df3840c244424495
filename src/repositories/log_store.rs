//! Bounded, newest-first event log persisted as one document

use std::sync::Arc;
use tracing::warn;

use crate::config::StoreKeys;
use crate::database::{get_json, put_json, SharedStore};
use crate::errors::StoreResult;
use crate::models::{LogEntry, LogLevel};
use crate::utils::Clock;

pub const DEFAULT_MAX_ENTRIES: usize = 100;

#[derive(Clone)]
pub struct LogStore {
    store: SharedStore,
    key: String,
    clock: Arc<dyn Clock>,
    max_entries: usize,
}

impl LogStore {
    pub fn new(store: SharedStore, keys: &StoreKeys, clock: Arc<dyn Clock>, max_entries: usize) -> Self {
        Self {
            store,
            key: keys.logs.clone(),
            clock,
            max_entries: max_entries.max(1),
        }
    }

    /// Prepend an entry and truncate to the cap
    pub async fn append(&self, level: LogLevel, message: impl Into<String>) -> StoreResult<()> {
        let mut entries: Vec<LogEntry> = get_json(self.store.as_ref(), &self.key)
            .await?
            .unwrap_or_default();

        entries.insert(
            0,
            LogEntry {
                time: self.clock.now(),
                level,
                message: message.into(),
            },
        );
        entries.truncate(self.max_entries);

        put_json(self.store.as_ref(), &self.key, &entries, None).await
    }

    /// Append, swallowing persistence failures. Logging must never abort the
    /// operation it describes.
    pub async fn record(&self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        if let Err(e) = self.append(level, message.clone()).await {
            warn!("Failed to record log entry '{}': {}", message, e);
        }
    }

    pub async fn info(&self, message: impl Into<String>) {
        self.record(LogLevel::Info, message).await;
    }

    pub async fn error(&self, message: impl Into<String>) {
        self.record(LogLevel::Error, message).await;
    }

    pub async fn list(&self) -> StoreResult<Vec<LogEntry>> {
        Ok(get_json(self.store.as_ref(), &self.key)
            .await?
            .unwrap_or_default())
    }
}
