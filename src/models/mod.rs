use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A remote playlist the service fetches and re-serves.
///
/// Persisted inside the catalog document with camelCase field names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SourceRecord {
    pub directory_name: String,
    pub source_url: String,
    pub extension: PlaylistExtension,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl SourceRecord {
    /// Public path the cached playlist is served under
    pub fn playlist_path(&self) -> String {
        format!("/{}/iptv.{}", self.directory_name, self.extension)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PlaylistExtension {
    M3u,
    M3u8,
    Txt,
    Json,
    Xml,
}

impl PlaylistExtension {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaylistExtension::M3u => "m3u",
            PlaylistExtension::M3u8 => "m3u8",
            PlaylistExtension::Txt => "txt",
            PlaylistExtension::Json => "json",
            PlaylistExtension::Xml => "xml",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            PlaylistExtension::M3u => "audio/x-mpegurl",
            PlaylistExtension::M3u8 => "application/vnd.apple.mpegurl",
            PlaylistExtension::Txt => "text/plain; charset=utf-8",
            PlaylistExtension::Json => "application/json",
            PlaylistExtension::Xml => "application/xml",
        }
    }
}

impl fmt::Display for PlaylistExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlaylistExtension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "m3u" => Ok(PlaylistExtension::M3u),
            "m3u8" => Ok(PlaylistExtension::M3u8),
            "txt" => Ok(PlaylistExtension::Txt),
            "json" => Ok(PlaylistExtension::Json),
            "xml" => Ok(PlaylistExtension::Xml),
            other => Err(format!("unsupported extension '{}'", other)),
        }
    }
}

/// Body of an add-source request. Missing fields deserialize as empty and
/// are rejected by validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceCreateRequest {
    #[serde(default)]
    pub directory_name: String,
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub extension: String,
}

impl SourceCreateRequest {
    pub fn new(
        directory_name: impl Into<String>,
        source_url: impl Into<String>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            directory_name: directory_name.into(),
            source_url: source_url.into(),
            extension: extension.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Error,
}

/// One entry of the durable event log shown to administrators
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogEntry {
    pub time: DateTime<Utc>,
    #[serde(rename = "type")]
    pub level: LogLevel,
    pub message: String,
}

/// Persisted admin session. `loginTime` is stored as epoch milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub username: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub login_time: DateTime<Utc>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

/// Tagged result of refreshing one source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RefreshOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl RefreshOutcome {
    pub fn success() -> Self {
        Self {
            success: true,
            error_message: None,
        }
    }

    pub fn failure(error_message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_message: Some(error_message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    pub source_count: usize,
    pub last_updated: Option<DateTime<Utc>>,
    pub interval_hours: u32,
    pub last_scheduled_check: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntervalUpdateRequest {
    pub hours: u32,
}
