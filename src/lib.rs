//! IPTV source cache
//!
//! Keeps a catalog of remote playlist sources, refreshes cached copies of
//! them on a schedule, and serves the cached playlists alongside a
//! session-guarded admin API.

pub mod auth;
pub mod config;
pub mod database;
pub mod errors;
pub mod ingestor;
pub mod models;
pub mod repositories;
pub mod services;
pub mod utils;
pub mod web;

#[cfg(test)]
mod testing;
