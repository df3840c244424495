//! Repositories over the key-value store
//!
//! Each repository owns one logical slice of the key layout:
//! - [`SourceCatalog`]: the ordered source list document
//! - [`ContentCache`]: one entry per cached playlist body
//! - [`LogStore`]: the bounded event log document
//! - [`SettingsRepository`]: refresh interval and last scheduled check

pub mod catalog;
pub mod content_cache;
pub mod log_store;
pub mod settings;

pub use catalog::SourceCatalog;
pub use content_cache::ContentCache;
pub use log_store::LogStore;
pub use settings::SettingsRepository;
