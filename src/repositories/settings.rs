//! Refresh interval and scheduler bookkeeping

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::config::StoreKeys;
use crate::database::SharedStore;
use crate::errors::{AppError, AppResult, StoreResult};

#[derive(Clone)]
pub struct SettingsRepository {
    store: SharedStore,
    keys: StoreKeys,
    default_interval_hours: u32,
}

impl SettingsRepository {
    pub fn new(store: SharedStore, keys: &StoreKeys, default_interval_hours: u32) -> Self {
        Self {
            store,
            keys: keys.clone(),
            default_interval_hours: default_interval_hours.max(1),
        }
    }

    /// Refresh interval in hours; absent or unreadable values fall back to the default
    pub async fn interval_hours(&self) -> StoreResult<u32> {
        let raw = self.store.get(&self.keys.interval).await?;
        Ok(match raw {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(hours) if hours >= 1 => hours,
                _ => {
                    warn!(
                        "Ignoring invalid stored refresh interval '{}', using default {}h",
                        raw, self.default_interval_hours
                    );
                    self.default_interval_hours
                }
            },
            None => self.default_interval_hours,
        })
    }

    pub async fn set_interval_hours(&self, hours: u32) -> AppResult<()> {
        if hours < 1 {
            return Err(AppError::invalid_input("hours", "interval must be at least 1 hour"));
        }
        self.store
            .put(&self.keys.interval, &hours.to_string(), None)
            .await?;
        Ok(())
    }

    pub async fn last_scheduled_check(&self) -> StoreResult<Option<DateTime<Utc>>> {
        let raw = self.store.get(&self.keys.last_scheduled_check).await?;
        Ok(raw.and_then(|raw| match DateTime::parse_from_rfc3339(raw.trim()) {
            Ok(parsed) => Some(parsed.with_timezone(&Utc)),
            Err(e) => {
                warn!("Ignoring unreadable last scheduled check '{}': {}", raw, e);
                None
            }
        }))
    }

    pub async fn mark_scheduled_check(&self, at: DateTime<Utc>) -> StoreResult<()> {
        self.store
            .put(&self.keys.last_scheduled_check, &at.to_rfc3339(), None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{KvStore, MemoryKvStore};
    use crate::utils::ManualClock;
    use std::sync::Arc;

    fn settings() -> (SettingsRepository, Arc<MemoryKvStore>) {
        let store = Arc::new(MemoryKvStore::new(Arc::new(ManualClock::default())));
        (
            SettingsRepository::new(store.clone(), &StoreKeys::default(), 24),
            store,
        )
    }

    #[tokio::test]
    async fn test_interval_defaults_to_24() {
        let (settings, _) = settings();
        assert_eq!(settings.interval_hours().await.unwrap(), 24);
    }

    #[tokio::test]
    async fn test_interval_persisted_as_text() {
        let (settings, store) = settings();
        settings.set_interval_hours(6).await.unwrap();
        assert_eq!(settings.interval_hours().await.unwrap(), 6);
        assert_eq!(store.get("download_interval").await.unwrap().as_deref(), Some("6"));
    }

    #[tokio::test]
    async fn test_zero_interval_rejected_without_write() {
        let (settings, store) = settings();
        let result = settings.set_interval_hours(0).await;
        assert!(matches!(result, Err(AppError::InvalidInput { .. })));
        assert!(store.get("download_interval").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_garbage_interval_falls_back() {
        let (settings, store) = settings();
        store.put("download_interval", "soon", None).await.unwrap();
        assert_eq!(settings.interval_hours().await.unwrap(), 24);
    }

    #[tokio::test]
    async fn test_last_scheduled_check_round_trip() {
        let (settings, _) = settings();
        assert_eq!(settings.last_scheduled_check().await.unwrap(), None);

        let at = chrono::Utc::now();
        settings.mark_scheduled_check(at).await.unwrap();
        assert_eq!(settings.last_scheduled_check().await.unwrap(), Some(at));
    }
}
