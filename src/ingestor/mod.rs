//! Source refreshing
//!
//! [`Refresher`] fetches one source and updates the content cache, the
//! catalog timestamp and the event log. [`scheduler`] drives it over the
//! whole catalog.

use std::sync::Arc;
use tracing::{info, warn};

use crate::errors::{AppError, AppResult, FetchError};
use crate::models::{RefreshOutcome, SourceRecord};
use crate::repositories::{ContentCache, LogStore, SourceCatalog};
use crate::utils::{display_url, Clock};

pub mod fetcher;
pub mod scheduler;

pub use fetcher::{FetchResponse, HttpFetcher, SourceFetcher};
pub use scheduler::{BatchJob, SchedulerService};

#[derive(Clone)]
pub struct Refresher {
    catalog: SourceCatalog,
    content: ContentCache,
    logs: LogStore,
    fetcher: Arc<dyn SourceFetcher>,
    clock: Arc<dyn Clock>,
}

impl Refresher {
    pub fn new(
        catalog: SourceCatalog,
        content: ContentCache,
        logs: LogStore,
        fetcher: Arc<dyn SourceFetcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            catalog,
            content,
            logs,
            fetcher,
            clock,
        }
    }

    /// Refresh one source. Every failure is converted into a failed
    /// [`RefreshOutcome`] plus one error log entry; nothing propagates.
    pub async fn refresh(&self, record: &SourceRecord) -> RefreshOutcome {
        match self.download(record).await {
            Ok(bytes) => {
                info!(
                    "Refreshed source '{}' from {} ({} bytes)",
                    record.directory_name,
                    display_url(&record.source_url),
                    bytes
                );
                self.logs
                    .info(format!(
                        "Downloaded {} ({})",
                        record.directory_name, record.source_url
                    ))
                    .await;
                RefreshOutcome::success()
            }
            Err(e) => {
                let detail = Self::describe(&e);
                warn!(
                    "Refresh failed for source '{}' ({}): {}",
                    record.directory_name,
                    display_url(&record.source_url),
                    detail
                );
                self.logs
                    .error(format!(
                        "Download failed for {}: {}",
                        record.directory_name, detail
                    ))
                    .await;
                RefreshOutcome::failure(detail)
            }
        }
    }

    async fn download(&self, record: &SourceRecord) -> AppResult<usize> {
        let response = self.fetcher.fetch(&record.source_url).await?;
        if !response.is_success() {
            return Err(FetchError::Http {
                status: response.status,
            }
            .into());
        }

        self.content
            .put(&record.directory_name, &response.body)
            .await?;
        let touched = self
            .catalog
            .touch_last_updated(&record.directory_name, self.clock.now())
            .await?;
        if !touched {
            // Removed while the fetch was in flight: drop the body just written
            self.content.delete(&record.directory_name).await?;
            return Err(AppError::not_found("source", &record.directory_name));
        }

        Ok(response.body.len())
    }

    fn describe(error: &AppError) -> String {
        match error {
            AppError::Fetch(fetch) => fetch.to_string(),
            other => other.to_string(),
        }
    }
}
