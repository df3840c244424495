//! Source catalog repository
//!
//! The catalog is one JSON document holding every [`SourceRecord`] in
//! insertion order. Every mutation rewrites the whole document, so two
//! concurrent writers resolve as last-writer-wins.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

use super::{ContentCache, LogStore};
use crate::config::StoreKeys;
use crate::database::{get_json, put_json, SharedStore};
use crate::errors::{AppError, AppResult};
use crate::models::{PlaylistExtension, SourceCreateRequest, SourceRecord};
use crate::utils::{is_path_segment, Clock};

#[derive(Clone)]
pub struct SourceCatalog {
    store: SharedStore,
    key: String,
    clock: Arc<dyn Clock>,
    content: ContentCache,
    logs: LogStore,
}

/// A create request that passed validation
struct ValidatedSource {
    directory_name: String,
    source_url: String,
    extension: PlaylistExtension,
}

impl SourceCatalog {
    pub fn new(
        store: SharedStore,
        keys: &StoreKeys,
        clock: Arc<dyn Clock>,
        content: ContentCache,
        logs: LogStore,
    ) -> Self {
        Self {
            store,
            key: keys.catalog.clone(),
            clock,
            content,
            logs,
        }
    }

    pub async fn list(&self) -> AppResult<Vec<SourceRecord>> {
        Ok(get_json(self.store.as_ref(), &self.key)
            .await?
            .unwrap_or_default())
    }

    pub async fn find(&self, directory_name: &str) -> AppResult<Option<SourceRecord>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|record| record.directory_name == directory_name))
    }

    pub async fn add(&self, request: SourceCreateRequest) -> AppResult<SourceRecord> {
        let validated = Self::validate(request)?;

        let mut records = self.list().await?;
        if records
            .iter()
            .any(|record| record.directory_name == validated.directory_name)
        {
            return Err(AppError::duplicate_key(validated.directory_name));
        }

        let record = SourceRecord {
            directory_name: validated.directory_name,
            source_url: validated.source_url,
            extension: validated.extension,
            created: self.clock.now(),
            last_updated: None,
        };
        records.push(record.clone());
        self.save(&records).await?;

        info!(
            "Added source '{}' ({})",
            record.directory_name, record.source_url
        );
        self.logs
            .info(format!("Added source: {}", record.directory_name))
            .await;

        Ok(record)
    }

    pub async fn remove(&self, directory_name: &str) -> AppResult<()> {
        let records = self.list().await?;
        let original_len = records.len();
        let remaining: Vec<SourceRecord> = records
            .into_iter()
            .filter(|record| record.directory_name != directory_name)
            .collect();

        if remaining.len() == original_len {
            return Err(AppError::not_found("source", directory_name));
        }

        self.save(&remaining).await?;
        self.content.delete(directory_name).await?;

        info!("Removed source '{}' and its cached content", directory_name);
        self.logs
            .info(format!("Removed source: {}", directory_name))
            .await;

        Ok(())
    }

    /// Stamp `last_updated` on one record. Returns false when the record no
    /// longer exists, which is not treated as an error.
    pub async fn touch_last_updated(
        &self,
        directory_name: &str,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let mut records = self.list().await?;
        match records
            .iter_mut()
            .find(|record| record.directory_name == directory_name)
        {
            Some(record) => {
                record.last_updated = Some(at);
                self.save(&records).await?;
                debug!("Updated last_updated for source '{}' to {}", directory_name, at);
                Ok(true)
            }
            None => {
                warn!(
                    "Source '{}' disappeared from the catalog before its timestamp could be updated",
                    directory_name
                );
                Ok(false)
            }
        }
    }

    async fn save(&self, records: &[SourceRecord]) -> AppResult<()> {
        put_json(self.store.as_ref(), &self.key, records, None).await?;
        Ok(())
    }

    fn validate(request: SourceCreateRequest) -> AppResult<ValidatedSource> {
        let directory_name = request.directory_name.trim();
        let source_url = request.source_url.trim();
        let extension = request.extension.trim();

        if directory_name.is_empty() {
            return Err(AppError::invalid_input("directoryName", "is required"));
        }
        if source_url.is_empty() {
            return Err(AppError::invalid_input("sourceUrl", "is required"));
        }
        if extension.is_empty() {
            return Err(AppError::invalid_input("extension", "is required"));
        }

        if !is_path_segment(directory_name) {
            return Err(AppError::invalid_input(
                "directoryName",
                "may only contain letters, digits, '-', '_' and '.'",
            ));
        }

        let parsed = Url::parse(source_url)
            .map_err(|e| AppError::invalid_input("sourceUrl", format!("not a valid URL: {}", e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AppError::invalid_input(
                "sourceUrl",
                format!("unsupported scheme '{}'", parsed.scheme()),
            ));
        }

        let extension = extension
            .parse::<PlaylistExtension>()
            .map_err(|e| AppError::invalid_input("extension", e))?;

        Ok(ValidatedSource {
            directory_name: directory_name.to_string(),
            source_url: source_url.to_string(),
            extension,
        })
    }
}
