//! Scheduled refreshing
//!
//! [`BatchJob`] refreshes the whole catalog once; [`SchedulerService`]
//! decides when a batch is due.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{debug, error, info, trace};

use super::Refresher;
use crate::database::SharedStore;
use crate::errors::AppResult;
use crate::models::BatchSummary;
use crate::repositories::{SettingsRepository, SourceCatalog};
use crate::utils::Clock;

/// One pass over the whole catalog.
///
/// Sources are refreshed sequentially in catalog order with a fixed pause
/// between them. A failing source never stops the batch, and nothing is
/// rolled back if the process dies halfway: the next run simply retries
/// everything.
#[derive(Clone)]
pub struct BatchJob {
    catalog: SourceCatalog,
    settings: SettingsRepository,
    refresher: Refresher,
    clock: Arc<dyn Clock>,
    pacing: Duration,
}

impl BatchJob {
    pub fn new(
        catalog: SourceCatalog,
        settings: SettingsRepository,
        refresher: Refresher,
        clock: Arc<dyn Clock>,
        pacing: Duration,
    ) -> Self {
        Self {
            catalog,
            settings,
            refresher,
            clock,
            pacing,
        }
    }

    pub async fn run_once(&self) -> AppResult<BatchSummary> {
        let started_at = self.clock.now();
        let sources = self.catalog.list().await?;
        let interval_hours = self.settings.interval_hours().await?;
        self.settings.mark_scheduled_check(started_at).await?;

        info!(
            "Scheduled refresh started: {} sources (interval {}h)",
            sources.len(),
            interval_hours
        );

        let mut summary = BatchSummary {
            started_at,
            total: sources.len(),
            succeeded: 0,
            failed: 0,
        };

        for (index, record) in sources.iter().enumerate() {
            if index > 0 && !self.pacing.is_zero() {
                sleep(self.pacing).await;
            }

            let outcome = self.refresher.refresh(record).await;
            if outcome.is_success() {
                summary.succeeded += 1;
            } else {
                summary.failed += 1;
            }
            debug!(
                "Batch progress {}/{}: '{}' success={}",
                index + 1,
                summary.total,
                record.directory_name,
                outcome.success
            );
        }

        info!(
            "Scheduled refresh finished: {} succeeded, {} failed",
            summary.succeeded, summary.failed
        );
        Ok(summary)
    }
}

/// Long-running loop that triggers [`BatchJob::run_once`] whenever the
/// configured interval has elapsed since the last scheduled check.
///
/// Expired store entries (mostly abandoned sessions) are purged after every
/// batch.
pub struct SchedulerService {
    job: BatchJob,
    settings: SettingsRepository,
    store: SharedStore,
    clock: Arc<dyn Clock>,
    check_interval: Duration,
}

impl SchedulerService {
    pub fn new(
        job: BatchJob,
        settings: SettingsRepository,
        store: SharedStore,
        clock: Arc<dyn Clock>,
        check_interval: Duration,
    ) -> Self {
        Self {
            job,
            settings,
            store,
            clock,
            check_interval,
        }
    }

    pub async fn start(self) {
        info!(
            "Starting scheduler service (checking every {}s)",
            self.check_interval.as_secs()
        );

        let mut ticker = interval(self.check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            trace!("Scheduler tick");

            match self.is_due().await {
                Ok(true) => {
                    if let Err(e) = self.job.run_once().await {
                        error!("Scheduled refresh failed: {}", e);
                    }
                    match self.store.purge_expired().await {
                        Ok(0) => {}
                        Ok(purged) => debug!("Purged {} expired store entries", purged),
                        Err(e) => error!("Failed to purge expired entries: {}", e),
                    }
                }
                Ok(false) => {}
                Err(e) => error!("Failed to check refresh schedule: {}", e),
            }
        }
    }

    /// True when no batch has run yet or the interval has elapsed since the last one
    pub async fn is_due(&self) -> AppResult<bool> {
        let last_check = self.settings.last_scheduled_check().await?;
        let interval_hours = self.settings.interval_hours().await?;
        Ok(Self::due_at(last_check, interval_hours, self.clock.now()))
    }

    fn due_at(last_check: Option<DateTime<Utc>>, interval_hours: u32, now: DateTime<Utc>) -> bool {
        match last_check {
            None => true,
            Some(last) => now.signed_duration_since(last) >= ChronoDuration::hours(i64::from(interval_hours)),
        }
    }
}
