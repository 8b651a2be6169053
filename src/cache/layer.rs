//! Cache layer that orchestrates read-through/write-through caching of JSON
//! responses.

use color_eyre::{eyre::eyre, Result};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

use super::traits::{CacheResult, CacheStorage};

/// Prefix shared by every cache key.
pub const CACHE_PREFIX: &str = "swCache";

/// Cache layer that sits between the catalog client and the network.
///
/// Entries are keyed by `swCache.{url}` and are never refreshed: once a URL
/// has been stored, every later lookup is served from storage.
#[derive(Clone)]
pub struct CacheLayer {
  storage: Arc<dyn CacheStorage>,
}

impl CacheLayer {
  /// Create a new cache layer with the given storage backend.
  pub fn new(storage: Arc<dyn CacheStorage>) -> Self {
    Self { storage }
  }

  /// The storage key for a request URL.
  pub fn key_for(url: &str) -> String {
    format!("{}.{}", CACHE_PREFIX, url)
  }

  /// Fetch a JSON document with cache-first strategy.
  ///
  /// 1. If the key is present, parse and return it - no network, no freshness check
  /// 2. Otherwise call `fetcher`, store the serialized result and return it
  ///
  /// Fetch errors and storage errors both propagate; nothing is retried.
  pub async fn fetch_json<F, Fut>(&self, url: &str, fetcher: F) -> Result<CacheResult<Value>>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Value>>,
  {
    let key = Self::key_for(url);

    if let Some(cached) = self.storage.get(&key)? {
      debug!(url, "cache hit");
      let value: Value = serde_json::from_str(&cached)
        .map_err(|e| eyre!("Failed to parse cached response for {}: {}", url, e))?;
      return Ok(CacheResult::from_cache(value));
    }

    debug!(url, "cache miss");
    let value = fetcher().await?;

    let text = serde_json::to_string(&value)
      .map_err(|e| eyre!("Failed to serialize response for {}: {}", url, e))?;
    self.storage.set(&key, &text)?;

    Ok(CacheResult::from_network(value))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{CacheSource, MemoryStorage};
  use serde_json::json;
  use std::sync::atomic::{AtomicU32, Ordering};

  #[test]
  fn test_key_format() {
    assert_eq!(
      CacheLayer::key_for("https://swapi.dev/api/people/?page=2"),
      "swCache.https://swapi.dev/api/people/?page=2"
    );
  }

  #[tokio::test]
  async fn test_second_fetch_served_from_cache() {
    let storage = Arc::new(MemoryStorage::new());
    let layer = CacheLayer::new(storage.clone());
    let calls = AtomicU32::new(0);
    let counter = &calls;

    let fetch = move || async move {
      counter.fetch_add(1, Ordering::SeqCst);
      Ok(json!({"name": "Tatooine", "residents": ["http://x/people/1/"]}))
    };

    let first = layer.fetch_json("http://x/planets/1/", fetch).await.unwrap();
    let second = layer.fetch_json("http://x/planets/1/", fetch).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(first.source, CacheSource::Network);
    assert_eq!(second.source, CacheSource::Cache);
    assert_eq!(first.data, second.data);
    assert!(storage
      .get("swCache.http://x/planets/1/")
      .unwrap()
      .is_some());
  }

  #[tokio::test]
  async fn test_fetch_error_is_not_cached() {
    let storage = Arc::new(MemoryStorage::new());
    let layer = CacheLayer::new(storage.clone());

    let result = layer
      .fetch_json("http://x/films/9/", || async { Err(eyre!("boom")) })
      .await;

    assert!(result.is_err());
    assert_eq!(storage.len(), 0);
  }

  #[tokio::test]
  async fn test_corrupt_entry_is_an_error() {
    let storage = Arc::new(MemoryStorage::new());
    storage.set("swCache.http://x/", "not json").unwrap();
    let layer = CacheLayer::new(storage);

    let result = layer
      .fetch_json("http://x/", || async { Ok(json!({})) })
      .await;

    assert!(result.is_err());
  }
}
