//! Persistent key-value cache for HTTP responses.
//!
//! This module provides a transport-agnostic caching mechanism that:
//! - Stores the JSON text of a response under `swCache.{url}`
//! - Serves every later request for the same literal URL from storage
//! - Never expires or invalidates entries
//!
//! Storage backends implement [`CacheStorage`] and are injected into the
//! [`CacheLayer`], so tests can swap in [`MemoryStorage`].

mod layer;
mod storage;
mod traits;

pub use layer::CacheLayer;
pub use storage::{MemoryStorage, NoopStorage, SqliteStorage};
pub use traits::{CacheResult, CacheSource, CacheStorage};
