//! Error type definitions for the IPTV source cache
//!
//! The hierarchy mirrors the layers of the service: storage failures,
//! outbound fetch failures, and the top-level application error that the
//! web layer maps onto HTTP status codes.

use thiserror::Error;

/// Top-level application error type
///
/// Validation errors (`InvalidInput`, `DuplicateKey`, `NotFound`) are raised
/// before any mutation happens. `Store` errors are fatal for the operation
/// that hit them; fetch errors are normally absorbed by the refresher.
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or malformed request data
    #[error("Invalid input: {field} - {message}")]
    InvalidInput { field: String, message: String },

    /// A record with the same identity already exists
    #[error("Duplicate key: {id} already exists")]
    DuplicateKey { id: String },

    /// Resource not found errors
    #[error("Not found: {resource} with id {id}")]
    NotFound { resource: String, id: String },

    /// Outbound source could not be fetched
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Credential check failed. Deliberately does not say which field was wrong.
    #[error("Invalid username or password")]
    AuthFailure,

    /// Session id missing, malformed, unknown or expired
    #[error("Session is invalid or expired")]
    InvalidSession,

    /// Persistence layer errors
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Key-value store specific errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite backend failures
    #[error("Storage backend failed: {0}")]
    Backend(#[from] sqlx::Error),

    /// Document serialization/deserialization failures
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Store could not be reached or refused the operation
    #[error("Storage unavailable: {message}")]
    Unavailable { message: String },
}

/// Outbound fetch errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Remote answered with a non-success status
    #[error("HTTP {status}")]
    Http { status: u16 },

    /// Request did not complete within the client timeout
    #[error("Connection timeout: {url}")]
    Timeout { url: String },

    /// Connection, TLS, DNS or body read failures
    #[error("Transport error: {message}")]
    Transport { message: String },
}

/// Convenience methods for creating common error types
impl AppError {
    /// Create an invalid input error for a named field
    pub fn invalid_input<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a duplicate key error
    pub fn duplicate_key<I: Into<String>>(id: I) -> Self {
        Self::DuplicateKey { id: id.into() }
    }

    /// Create a not found error for a specific resource
    pub fn not_found<R: Into<String>, I: Into<String>>(resource: R, id: I) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// True for errors caused by the caller rather than the service
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput { .. }
                | Self::DuplicateKey { .. }
                | Self::NotFound { .. }
                | Self::AuthFailure
                | Self::InvalidSession
        )
    }
}

impl StoreError {
    /// Create an unavailable error
    pub fn unavailable<S: Into<String>>(message: S) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

impl FetchError {
    /// Create a transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout<U: Into<String>>(url: U) -> Self {
        Self::Timeout { url: url.into() }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        match (error.is_timeout(), error.url()) {
            (true, Some(url)) => Self::timeout(url.as_str()),
            (true, None) => Self::timeout("unknown"),
            _ => Self::transport(error.to_string()),
        }
    }
}
