use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment prefix for layered overrides, e.g. `IPTV_CACHE_WEB__PORT=9000`
pub const ENV_PREFIX: &str = "IPTV_CACHE";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub web: WebConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub keys: StoreKeys,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite URL, or `memory` for the in-process store
    pub url: String,
    pub max_connections: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
    pub session_ttl_days: u32,
    pub cookie_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    pub default_interval_hours: u32,
    /// Delay between two sources inside one batch
    pub pacing_ms: u64,
    pub fetch_timeout_secs: u64,
    /// How often the scheduler checks whether a batch is due
    pub check_interval_secs: u64,
    pub max_log_entries: usize,
    pub user_agent: String,
}

/// Logical key layout inside the key-value store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreKeys {
    pub catalog: String,
    pub content_prefix: String,
    pub interval: String,
    pub session_prefix: String,
    pub logs: String,
    pub last_scheduled_check: String,
}

impl Default for StoreKeys {
    fn default() -> Self {
        Self {
            catalog: "iptv_configs".to_string(),
            content_prefix: "file_".to_string(),
            interval: "download_interval".to_string(),
            session_prefix: "admin_session_".to_string(),
            logs: "logs".to_string(),
            last_scheduled_check: "last_scheduled_check".to_string(),
        }
    }
}

impl StoreKeys {
    pub fn content(&self, directory_name: &str) -> String {
        format!("{}{}", self.content_prefix, directory_name)
    }

    pub fn session(&self, session_id: &str) -> String {
        format!("{}{}", self.session_prefix, session_id)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            web: WebConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: "sqlite://./iptv-cache.db".to_string(),
                max_connections: Some(5),
            },
            auth: AuthConfig {
                username: "admin".to_string(),
                password: "admin123".to_string(),
                session_ttl_days: 7,
                cookie_name: "admin_session".to_string(),
            },
            refresh: RefreshConfig {
                default_interval_hours: 24,
                pacing_ms: 1000,
                fetch_timeout_secs: 30,
                check_interval_secs: 60,
                max_log_entries: 100,
                user_agent: format!("iptv-source-cache/{}", env!("CARGO_PKG_VERSION")),
            },
            keys: StoreKeys::default(),
        }
    }
}

impl Config {
    /// Load defaults, then `config_file` if present, then environment overrides.
    pub fn load(config_file: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default())?)
            .add_source(config::File::new(config_file, config::FileFormat::Toml).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let mut loaded: Self = settings.try_deserialize()?;

        // Credential overrides kept compatible with older deployments
        if let Ok(username) = std::env::var("ADMIN_USERNAME") {
            loaded.auth.username = username;
        }
        if let Ok(password) = std::env::var("ADMIN_PASSWORD") {
            loaded.auth.password = password;
        }

        loaded.validate()?;
        Ok(loaded)
    }

    pub fn validate(&self) -> Result<()> {
        if self.auth.username.is_empty() || self.auth.password.is_empty() {
            anyhow::bail!("auth.username and auth.password must not be empty");
        }
        if self.auth.session_ttl_days == 0 {
            anyhow::bail!("auth.session_ttl_days must be at least 1");
        }
        if self.refresh.default_interval_hours == 0 {
            anyhow::bail!("refresh.default_interval_hours must be at least 1");
        }
        if self.refresh.max_log_entries == 0 {
            anyhow::bail!("refresh.max_log_entries must be at least 1");
        }
        Ok(())
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database.url == "memory"
    }
}

impl AuthConfig {
    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.session_ttl_days))
    }
}

impl RefreshConfig {
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs.max(1))
    }
}
