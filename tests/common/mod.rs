//! Shared fixtures for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use iptv_source_cache::{
    config::Config,
    database::MemoryKvStore,
    errors::{FetchError, FetchResult},
    ingestor::{FetchResponse, SourceFetcher},
    services::PlaylistService,
    utils::ManualClock,
};

/// Fetcher answering from a fixed table. Unknown URLs fail like a refused
/// connection.
#[derive(Default)]
pub struct StubFetcher {
    responses: Mutex<HashMap<String, (u16, String)>>,
}

impl StubFetcher {
    pub fn respond(&self, url: &str, status: u16, body: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), (status, body.to_string()));
    }
}

#[async_trait]
impl SourceFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<FetchResponse> {
        match self.responses.lock().unwrap().get(url) {
            Some((status, body)) => Ok(FetchResponse {
                status: *status,
                body: body.clone(),
            }),
            None => Err(FetchError::transport(format!("connection refused: {}", url))),
        }
    }
}

pub struct TestApp {
    pub service: PlaylistService,
    pub fetcher: Arc<StubFetcher>,
    pub clock: ManualClock,
    pub config: Config,
}

pub fn test_app() -> TestApp {
    let clock = ManualClock::default();
    let store = Arc::new(MemoryKvStore::new(Arc::new(clock.clone())));
    let fetcher = Arc::new(StubFetcher::default());

    let mut config = Config::default();
    config.database.url = "memory".to_string();
    config.refresh.pacing_ms = 0;

    let service = PlaylistService::new(store, fetcher.clone(), Arc::new(clock.clone()), &config);
    TestApp {
        service,
        fetcher,
        clock,
        config,
    }
}
