//! Raw playlist bodies keyed by directory name

use crate::config::StoreKeys;
use crate::database::SharedStore;
use crate::errors::StoreResult;

#[derive(Clone)]
pub struct ContentCache {
    store: SharedStore,
    keys: StoreKeys,
}

impl ContentCache {
    pub fn new(store: SharedStore, keys: &StoreKeys) -> Self {
        Self {
            store,
            keys: keys.clone(),
        }
    }

    pub async fn get(&self, directory_name: &str) -> StoreResult<Option<String>> {
        self.store.get(&self.keys.content(directory_name)).await
    }

    pub async fn put(&self, directory_name: &str, content: &str) -> StoreResult<()> {
        self.store
            .put(&self.keys.content(directory_name), content, None)
            .await
    }

    pub async fn delete(&self, directory_name: &str) -> StoreResult<()> {
        self.store.delete(&self.keys.content(directory_name)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{KvStore, MemoryKvStore};
    use crate::utils::ManualClock;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_content_lifecycle() {
        let store = Arc::new(MemoryKvStore::new(Arc::new(ManualClock::default())));
        let cache = ContentCache::new(store.clone(), &StoreKeys::default());

        assert_eq!(cache.get("news").await.unwrap(), None);

        cache.put("news", "#EXTM3U\n").await.unwrap();
        cache.put("news", "#EXTM3U\n#EXTINF:-1,One\n").await.unwrap();
        assert_eq!(
            cache.get("news").await.unwrap().as_deref(),
            Some("#EXTM3U\n#EXTINF:-1,One\n")
        );
        assert!(store.get("file_news").await.unwrap().is_some());

        cache.delete("news").await.unwrap();
        cache.delete("news").await.unwrap();
        assert_eq!(cache.get("news").await.unwrap(), None);
    }
}
