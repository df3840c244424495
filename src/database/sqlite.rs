//! SQLite-backed key-value store

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::KvStore;
use crate::config::DatabaseConfig;
use crate::errors::{StoreError, StoreResult};
use crate::utils::time::epoch_millis;
use crate::utils::Clock;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS kv_entries (
        key TEXT PRIMARY KEY NOT NULL,
        value TEXT NOT NULL,
        expires_at INTEGER
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_kv_entries_expires_at ON kv_entries (expires_at)",
];

#[derive(Clone)]
pub struct SqliteKvStore {
    pool: Pool<Sqlite>,
    clock: Arc<dyn Clock>,
}

impl SqliteKvStore {
    pub async fn connect(config: &DatabaseConfig, clock: Arc<dyn Clock>) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)?.create_if_missing(true);

        // An in-memory database only exists per connection
        let max_connections = if config.url.contains(":memory:") {
            1
        } else {
            config.max_connections.unwrap_or(5).max(1)
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        info!("Connected to key-value database: {}", config.url);
        Ok(Self { pool, clock })
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        debug!("Key-value schema is up to date");
        Ok(())
    }

    fn expiry_for(&self, ttl: Option<Duration>) -> StoreResult<Option<i64>> {
        match ttl {
            Some(ttl) => {
                let ttl = chrono::Duration::from_std(ttl)
                    .map_err(|e| StoreError::unavailable(format!("invalid ttl: {}", e)))?;
                Ok(Some(epoch_millis(self.clock.now() + ttl)))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl KvStore for SqliteKvStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let row = sqlx::query_as::<_, (String, Option<i64>)>(
            "SELECT value, expires_at FROM kv_entries WHERE key = ?",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some((value, expires_at)) => {
                let now = epoch_millis(self.clock.now());
                if expires_at.is_some_and(|at| at <= now) {
                    sqlx::query("DELETE FROM kv_entries WHERE key = ? AND expires_at <= ?")
                        .bind(key)
                        .bind(now)
                        .execute(&self.pool)
                        .await?;
                    Ok(None)
                } else {
                    Ok(Some(value))
                }
            }
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()> {
        let expires_at = self.expiry_for(ttl)?;
        sqlx::query(
            r#"
            INSERT INTO kv_entries (key, value, expires_at) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM kv_entries WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn purge_expired(&self) -> StoreResult<u64> {
        let now = epoch_millis(self.clock.now());
        let result = sqlx::query(
            "DELETE FROM kv_entries WHERE expires_at IS NOT NULL AND expires_at <= ?",
        )
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::ManualClock;

    async fn file_store(dir: &tempfile::TempDir, clock: ManualClock) -> SqliteKvStore {
        let url = format!("sqlite://{}", dir.path().join("kv.db").display());
        let store = SqliteKvStore::connect(
            &DatabaseConfig {
                url,
                max_connections: Some(2),
            },
            Arc::new(clock),
        )
        .await
        .unwrap();
        store.migrate().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_round_trip_and_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = file_store(&dir, ManualClock::default()).await;

        assert_eq!(store.get("iptv_configs").await.unwrap(), None);
        store.put("iptv_configs", "[]", None).await.unwrap();
        store.put("iptv_configs", "[1]", None).await.unwrap();
        assert_eq!(store.get("iptv_configs").await.unwrap().as_deref(), Some("[1]"));

        store.delete("iptv_configs").await.unwrap();
        store.delete("iptv_configs").await.unwrap();
        assert_eq!(store.get("iptv_configs").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_rows_read_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let clock = ManualClock::default();
        let store = file_store(&dir, clock.clone()).await;

        store
            .put("admin_session_x", "{}", Some(Duration::from_secs(3600)))
            .await
            .unwrap();
        store.put("keep", "v", None).await.unwrap();
        assert!(store.get("admin_session_x").await.unwrap().is_some());

        clock.advance(chrono::Duration::hours(2));
        assert!(store.get("admin_session_x").await.unwrap().is_none());
        assert_eq!(store.get("keep").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let dir = tempfile::tempdir().unwrap();
        let clock = ManualClock::default();
        let store = file_store(&dir, clock.clone()).await;

        store.put("a", "1", Some(Duration::from_secs(1))).await.unwrap();
        store.put("b", "2", Some(Duration::from_secs(1))).await.unwrap();
        store.put("c", "3", None).await.unwrap();

        clock.advance(chrono::Duration::seconds(5));
        assert_eq!(store.purge_expired().await.unwrap(), 2);
        assert_eq!(store.get("c").await.unwrap().as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn test_in_memory_url() {
        let store = SqliteKvStore::connect(
            &DatabaseConfig {
                url: "sqlite::memory:".to_string(),
                max_connections: None,
            },
            Arc::new(ManualClock::default()),
        )
        .await
        .unwrap();
        store.migrate().await.unwrap();

        store.put("k", "v", None).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    }
}
