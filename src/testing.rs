//! Test doubles shared by unit tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::database::{KvStore, MemoryKvStore};
use crate::errors::{FetchError, FetchResult, StoreError, StoreResult};
use crate::ingestor::{FetchResponse, SourceFetcher};
use crate::utils::ManualClock;

/// Memory store that can be told to fail writes to one key, or everything
pub struct FailingStore {
    inner: MemoryKvStore,
    failing_key: Option<String>,
    unavailable: AtomicBool,
}

impl FailingStore {
    pub fn failing_puts_on(key: &str, clock: ManualClock) -> Self {
        Self {
            inner: MemoryKvStore::new(Arc::new(clock)),
            failing_key: Some(key.to_string()),
            unavailable: AtomicBool::new(false),
        }
    }

    pub fn healthy(clock: ManualClock) -> Self {
        Self {
            inner: MemoryKvStore::new(Arc::new(clock)),
            failing_key: None,
            unavailable: AtomicBool::new(false),
        }
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("store offline"));
        }
        Ok(())
    }
}

#[async_trait]
impl KvStore for FailingStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.check()?;
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()> {
        self.check()?;
        if self.failing_key.as_deref() == Some(key) {
            return Err(StoreError::unavailable(format!("write to '{}' rejected", key)));
        }
        self.inner.put(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.check()?;
        self.inner.delete(key).await
    }
}

/// Fetcher answering from a fixed table and recording every requested URL
#[derive(Default)]
pub struct StubFetcher {
    responses: Mutex<HashMap<String, FetchResult<FetchResponse>>>,
    calls: Mutex<Vec<String>>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &str, status: u16, body: &str) {
        self.responses.lock().unwrap().insert(
            url.to_string(),
            Ok(FetchResponse {
                status,
                body: body.to_string(),
            }),
        );
    }

    pub fn fail(&self, url: &str, error: FetchError) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), Err(error));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SourceFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<FetchResponse> {
        self.calls.lock().unwrap().push(url.to_string());
        self.responses
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| Err(FetchError::transport(format!("no route to {}", url))))
    }
}
