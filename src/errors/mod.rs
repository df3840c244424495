//! Centralized error handling for the IPTV source cache
//!
//! # Usage
//!
//! ```rust
//! use iptv_source_cache::errors::{AppError, AppResult};
//!
//! fn check(name: &str) -> AppResult<()> {
//!     if name.is_empty() {
//!         return Err(AppError::invalid_input("directoryName", "must not be empty"));
//!     }
//!     Ok(())
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for key-value store Results
pub type StoreResult<T> = Result<T, StoreError>;

/// Convenience type alias for outbound fetch Results
pub type FetchResult<T> = Result<T, FetchError>;
