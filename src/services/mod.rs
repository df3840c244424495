//! Service layer
//!
//! Business operations composed from the repositories, the ingestor and
//! the session manager.

pub mod playlist;

pub use playlist::PlaylistService;
