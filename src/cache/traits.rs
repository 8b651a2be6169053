//! Core traits and types for the caching system.

use color_eyre::Result;

/// Trait for cache storage backends.
///
/// Keys are opaque strings and values are raw JSON text. There is no expiry
/// and no size bound; a second `set` on the same key replaces the first.
pub trait CacheStorage: Send + Sync {
  /// Look up the stored text for `key`.
  fn get(&self, key: &str) -> Result<Option<String>>;

  /// Store `value` under `key`, replacing any previous entry.
  fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Indicates where a fetched value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fetched over the network and written to the cache
  Network,
  /// Served from the cache without touching the network
  Cache,
}

/// Result from a cache operation, including where the data came from.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
}

impl<T> CacheResult<T> {
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
    }
  }

  pub fn from_cache(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Cache,
    }
  }
}
