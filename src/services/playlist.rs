//! Playlist Service
//!
//! Facade over the repositories, the refresher and the session manager.
//! The web layer and the CLI only ever talk to this type.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::{
    auth::SessionManager,
    config::Config,
    database::SharedStore,
    errors::{AppError, AppResult},
    ingestor::{BatchJob, Refresher, SchedulerService, SourceFetcher},
    models::{
        BatchSummary, LogEntry, PlaylistExtension, SourceCreateRequest, SourceRecord,
        SystemStatus,
    },
    repositories::{ContentCache, LogStore, SettingsRepository, SourceCatalog},
    utils::Clock,
};

#[derive(Clone)]
pub struct PlaylistService {
    catalog: SourceCatalog,
    content: ContentCache,
    settings: SettingsRepository,
    logs: LogStore,
    sessions: SessionManager,
    refresher: Refresher,
    batch: BatchJob,
    store: SharedStore,
    clock: Arc<dyn Clock>,
}

impl PlaylistService {
    pub fn new(
        store: SharedStore,
        fetcher: Arc<dyn SourceFetcher>,
        clock: Arc<dyn Clock>,
        config: &Config,
    ) -> Self {
        let keys = &config.keys;
        let content = ContentCache::new(store.clone(), keys);
        let logs = LogStore::new(
            store.clone(),
            keys,
            clock.clone(),
            config.refresh.max_log_entries,
        );
        let catalog = SourceCatalog::new(
            store.clone(),
            keys,
            clock.clone(),
            content.clone(),
            logs.clone(),
        );
        let settings =
            SettingsRepository::new(store.clone(), keys, config.refresh.default_interval_hours);
        let sessions = SessionManager::new(store.clone(), keys, clock.clone(), &config.auth);
        let refresher = Refresher::new(
            catalog.clone(),
            content.clone(),
            logs.clone(),
            fetcher,
            clock.clone(),
        );
        let batch = BatchJob::new(
            catalog.clone(),
            settings.clone(),
            refresher.clone(),
            clock.clone(),
            config.refresh.pacing(),
        );

        Self {
            catalog,
            content,
            settings,
            logs,
            sessions,
            refresher,
            batch,
            store,
            clock,
        }
    }

    /// Scheduler loop driving this service's batch job
    pub fn scheduler(&self, check_interval: std::time::Duration) -> SchedulerService {
        SchedulerService::new(
            self.batch.clone(),
            self.settings.clone(),
            self.store.clone(),
            self.clock.clone(),
            check_interval,
        )
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        self.sessions.ttl()
    }

    // Sources

    pub async fn list_sources(&self) -> AppResult<Vec<SourceRecord>> {
        self.catalog.list().await
    }

    pub async fn add_source(&self, request: SourceCreateRequest) -> AppResult<SourceRecord> {
        self.catalog.add(request).await
    }

    pub async fn remove_source(&self, directory_name: &str) -> AppResult<()> {
        self.catalog.remove(directory_name).await
    }

    /// Start refreshing one source in the background and return immediately.
    ///
    /// Only the lookup can fail; the outcome of the refresh itself lands in
    /// the event log.
    pub async fn refresh_one(&self, directory_name: &str) -> AppResult<()> {
        let record = self
            .catalog
            .find(directory_name)
            .await?
            .ok_or_else(|| AppError::not_found("source", directory_name))?;

        let refresher = self.refresher.clone();
        tokio::spawn(async move {
            let outcome = refresher.refresh(&record).await;
            debug!(
                "Manual refresh of '{}' finished: success={}",
                record.directory_name, outcome.success
            );
        });
        Ok(())
    }

    pub async fn run_scheduled_batch(&self) -> AppResult<BatchSummary> {
        self.batch.run_once().await
    }

    /// Run a batch on a detached task
    pub fn spawn_scheduled_batch(&self) {
        let batch = self.batch.clone();
        tokio::spawn(async move {
            if let Err(e) = batch.run_once().await {
                error!("Out-of-band refresh batch failed: {}", e);
            }
        });
        info!("Out-of-band refresh batch triggered");
    }

    // Sessions

    pub async fn login(
        &self,
        username: &str,
        password: &str,
        user_agent: Option<&str>,
    ) -> AppResult<String> {
        self.sessions.login(username, password, user_agent).await
    }

    pub async fn validate_session(&self, session_id: &str) -> AppResult<String> {
        self.sessions.validate(session_id).await
    }

    pub async fn logout(&self, session_id: &str) -> AppResult<()> {
        self.sessions.logout(session_id).await
    }

    // Settings and diagnostics

    pub async fn recent_logs(&self) -> AppResult<Vec<LogEntry>> {
        Ok(self.logs.list().await?)
    }

    pub async fn interval(&self) -> AppResult<u32> {
        Ok(self.settings.interval_hours().await?)
    }

    pub async fn set_interval(&self, hours: u32) -> AppResult<()> {
        self.settings.set_interval_hours(hours).await?;
        self.logs
            .info(format!("Download interval set to {} hours", hours))
            .await;
        Ok(())
    }

    /// Raw cached body of a known source
    pub async fn cached_content(&self, directory_name: &str) -> AppResult<String> {
        if self.catalog.find(directory_name).await?.is_none() {
            return Err(AppError::not_found("source", directory_name));
        }
        self.content
            .get(directory_name)
            .await?
            .ok_or_else(|| AppError::not_found("content", directory_name))
    }

    /// Cached playlist for `/<directory>/iptv.<extension>`.
    ///
    /// The requested extension must be the one the source was registered
    /// with.
    pub async fn playlist(
        &self,
        directory_name: &str,
        extension: PlaylistExtension,
    ) -> AppResult<String> {
        match self.catalog.find(directory_name).await? {
            Some(record) if record.extension == extension => {}
            _ => {
                return Err(AppError::not_found(
                    "playlist",
                    format!("{}/iptv.{}", directory_name, extension),
                ))
            }
        }
        self.content
            .get(directory_name)
            .await?
            .ok_or_else(|| AppError::not_found("content", directory_name))
    }

    pub async fn status(&self) -> AppResult<SystemStatus> {
        let sources = self.catalog.list().await?;
        let last_updated: Option<DateTime<Utc>> =
            sources.iter().filter_map(|record| record.last_updated).max();

        Ok(SystemStatus {
            source_count: sources.len(),
            last_updated,
            interval_hours: self.settings.interval_hours().await?,
            last_scheduled_check: self.settings.last_scheduled_check().await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryKvStore;
    use crate::testing::StubFetcher;
    use crate::utils::ManualClock;
    use std::time::Duration;
    use tokio_test::{assert_err, assert_ok};

    struct Fixture {
        service: PlaylistService,
        fetcher: Arc<StubFetcher>,
        clock: ManualClock,
    }

    fn fixture() -> Fixture {
        let clock = ManualClock::default();
        let store = Arc::new(MemoryKvStore::new(Arc::new(clock.clone())));
        let fetcher = Arc::new(StubFetcher::new());
        let mut config = Config::default();
        config.refresh.pacing_ms = 0;
        let service = PlaylistService::new(store, fetcher.clone(), Arc::new(clock.clone()), &config);
        Fixture {
            service,
            fetcher,
            clock,
        }
    }

    fn news() -> SourceCreateRequest {
        SourceCreateRequest::new("news", "http://example.com/news.m3u", "m3u")
    }

    #[tokio::test]
    async fn test_add_list_remove() {
        let f = fixture();
        assert!(f.service.list_sources().await.unwrap().is_empty());

        assert_ok!(f.service.add_source(news()).await);
        assert!(matches!(
            f.service.add_source(news()).await,
            Err(AppError::DuplicateKey { .. })
        ));
        assert_eq!(f.service.list_sources().await.unwrap().len(), 1);

        assert_ok!(f.service.remove_source("news").await);
        assert_err!(f.service.remove_source("news").await);
        assert!(f.service.list_sources().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_playlist_requires_matching_extension_and_content() {
        let f = fixture();
        f.service.add_source(news()).await.unwrap();

        // Registered but not downloaded yet
        assert!(matches!(
            f.service.playlist("news", PlaylistExtension::M3u).await,
            Err(AppError::NotFound { .. })
        ));

        f.fetcher
            .respond("http://example.com/news.m3u", 200, "#EXTM3U\n#EXTINF:-1,News");
        f.service.run_scheduled_batch().await.unwrap();

        assert_eq!(
            f.service.playlist("news", PlaylistExtension::M3u).await.unwrap(),
            "#EXTM3U\n#EXTINF:-1,News"
        );
        assert!(matches!(
            f.service.playlist("news", PlaylistExtension::M3u8).await,
            Err(AppError::NotFound { .. })
        ));
        assert!(matches!(
            f.service.playlist("sports", PlaylistExtension::M3u).await,
            Err(AppError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_refresh_one_unknown_source() {
        let f = fixture();
        assert!(matches!(
            f.service.refresh_one("ghost").await,
            Err(AppError::NotFound { .. })
        ));
        assert!(f.fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_one_runs_in_background() {
        let f = fixture();
        f.service.add_source(news()).await.unwrap();
        f.fetcher
            .respond("http://example.com/news.m3u", 200, "#EXTM3U");

        f.service.refresh_one("news").await.unwrap();

        let mut content = None;
        for _ in 0..50 {
            if let Ok(body) = f.service.cached_content("news").await {
                content = Some(body);
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(content.as_deref(), Some("#EXTM3U"));
    }

    #[tokio::test]
    async fn test_status_reports_newest_update() {
        let f = fixture();
        f.service.add_source(news()).await.unwrap();
        f.service
            .add_source(SourceCreateRequest::new(
                "sports",
                "http://example.com/sports.m3u8",
                "m3u8",
            ))
            .await
            .unwrap();
        f.fetcher.respond("http://example.com/news.m3u", 200, "a");
        f.fetcher.respond("http://example.com/sports.m3u8", 200, "b");

        let before = f.service.status().await.unwrap();
        assert_eq!(before.source_count, 2);
        assert!(before.last_updated.is_none());
        assert!(before.last_scheduled_check.is_none());
        assert_eq!(before.interval_hours, 24);

        f.service.run_scheduled_batch().await.unwrap();
        let after = f.service.status().await.unwrap();
        assert_eq!(after.last_updated, Some(f.clock.now()));
        assert_eq!(after.last_scheduled_check, Some(f.clock.now()));
    }

    #[tokio::test]
    async fn test_set_interval_is_logged() {
        let f = fixture();
        f.service.set_interval(6).await.unwrap();

        assert_eq!(f.service.interval().await.unwrap(), 6);
        let logs = f.service.recent_logs().await.unwrap();
        assert_eq!(logs[0].message, "Download interval set to 6 hours");
        assert_err!(f.service.set_interval(0).await);
    }
}
