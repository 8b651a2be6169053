//! Catalog client: cached requests plus the category, collection and entity
//! lookups built on top of them.

use color_eyre::{eyre::eyre, Result};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::cache::{CacheLayer, CacheStorage, MemoryStorage, NoopStorage, SqliteStorage};
use crate::config::Config;

use super::transport::{HttpTransport, Transport};
use super::types::{CategoryMap, Entity, ResultPage};

/// Read-only client for a paginated REST catalog.
///
/// Every lookup goes through [`CatalogClient::request`], which serves
/// repeated URLs from the cache.
#[derive(Clone)]
pub struct CatalogClient {
  transport: Arc<dyn Transport>,
  cache: CacheLayer,
  root: String,
  max_concurrency: Option<usize>,
}

impl CatalogClient {
  /// Create a client from configuration, opening the configured cache.
  pub fn new(config: &Config) -> Result<Self> {
    let transport = HttpTransport::new(Duration::from_secs(config.timeout_secs))?;

    let storage: Arc<dyn CacheStorage> = if config.cache.enabled {
      match SqliteStorage::open(config.cache.path.as_deref()) {
        Ok(storage) => Arc::new(storage),
        Err(e) => {
          // Cache for this session only
          warn!("Failed to open response cache, using memory: {:#}", e);
          Arc::new(MemoryStorage::new())
        }
      }
    } else {
      info!("response cache disabled");
      Arc::new(NoopStorage)
    };

    Ok(
      Self::with_parts(&config.root, Arc::new(transport), storage)
        .with_max_concurrency(config.resolver.max_concurrency),
    )
  }

  /// Assemble a client from explicit parts.
  pub fn with_parts(
    root: &str,
    transport: Arc<dyn Transport>,
    storage: Arc<dyn CacheStorage>,
  ) -> Self {
    Self {
      transport,
      cache: CacheLayer::new(storage),
      root: root.to_string(),
      max_concurrency: None,
    }
  }

  /// Bound how many URLs of one reference list are fetched at once.
  pub fn with_max_concurrency(mut self, limit: Option<usize>) -> Self {
    self.max_concurrency = limit.filter(|l| *l > 0);
    self
  }

  pub fn root(&self) -> &str {
    &self.root
  }

  pub fn max_concurrency(&self) -> Option<usize> {
    self.max_concurrency
  }

  /// GET a URL as JSON, reading through and writing through the cache.
  pub async fn request(&self, url: &str) -> Result<Value> {
    let transport = Arc::clone(&self.transport);
    let result = self
      .cache
      .fetch_json(url, || async move { transport.get_json(url).await })
      .await?;
    debug!(url, source = ?result.source, "request complete");
    Ok(result.data)
  }

  /// GET a URL that is expected to hold a single entity. Whatever JSON comes
  /// back is accepted; a non-object body is wrapped by [`Entity::from_value`].
  pub async fn request_entity(&self, url: &str) -> Result<Entity> {
    Ok(Entity::from_value(self.request(url).await?))
  }

  /// Fetch the root resource: category name to collection URL.
  pub async fn get_categories(&self) -> Result<CategoryMap> {
    match self.request(&self.root).await? {
      Value::Object(map) => Ok(CategoryMap::from_json(&map)),
      other => Err(eyre!(
        "Expected an object from {}, got {}",
        self.root,
        json_kind(&other)
      )),
    }
  }

  /// Fetch one page of a category, optionally filtered by a search term.
  pub async fn get_resources(
    &self,
    resource_type: &str,
    page: u32,
    search_query: &str,
  ) -> Result<ResultPage> {
    let url = self.resources_url(resource_type, page, search_query);
    let value = self.request(&url).await?;
    serde_json::from_value(value).map_err(|e| eyre!("Failed to parse page from {}: {}", url, e))
  }

  /// Fetch a single entity by category and id. References are left as URLs.
  pub async fn get_resource_details(&self, resource_type: &str, resource_id: &str) -> Result<Entity> {
    let url = self.details_url(resource_type, resource_id);
    self.request_entity(&url).await
  }

  /// `{root}/{type}/?page={n}` plus `&search={q}` when a search term is set.
  ///
  /// The root's trailing `/` is dropped before joining and the term is
  /// form-urlencoded, so `death star` is requested (and cached) as
  /// `search=death+star`.
  pub fn resources_url(&self, resource_type: &str, page: u32, search_query: &str) -> String {
    let mut url = format!("{}/{}/?page={}", self.base(), resource_type, page);
    if !search_query.is_empty() {
      let encoded: String = ::url::form_urlencoded::byte_serialize(search_query.as_bytes()).collect();
      url.push_str("&search=");
      url.push_str(&encoded);
    }
    url
  }

  pub fn details_url(&self, resource_type: &str, resource_id: &str) -> String {
    format!("{}/{}/{}", self.base(), resource_type, resource_id)
  }

  fn base(&self) -> &str {
    self.root.trim_end_matches('/')
  }
}

fn json_kind(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "a boolean",
    Value::Number(_) => "a number",
    Value::String(_) => "a string",
    Value::Array(_) => "an array",
    Value::Object(_) => "an object",
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::MemoryStorage;
  use crate::catalog::transport::fake::FakeTransport;
  use serde_json::json;

  const ROOT: &str = "https://swapi.dev/api/";

  fn client(transport: FakeTransport) -> (CatalogClient, Arc<FakeTransport>, Arc<MemoryStorage>) {
    let transport = Arc::new(transport);
    let storage = Arc::new(MemoryStorage::new());
    let client = CatalogClient::with_parts(ROOT, transport.clone(), storage.clone());
    (client, transport, storage)
  }

  #[tokio::test]
  async fn test_request_hits_network_once() {
    let url = "https://swapi.dev/api/people/1/";
    let (client, transport, _) = client(FakeTransport::new().with(url, json!({"name": "Luke"})));

    let first = client.request(url).await.unwrap();
    let second = client.request(url).await.unwrap();

    assert_eq!(transport.calls(), 1);
    assert_eq!(first, second);
  }

  #[tokio::test]
  async fn test_request_failure_propagates_and_is_not_cached() {
    let url = "https://swapi.dev/api/people/999/";
    let (client, transport, storage) = client(FakeTransport::new().failing(url, "offline"));

    assert!(client.request(url).await.is_err());
    assert!(client.request(url).await.is_err());
    assert_eq!(transport.calls(), 2);
    assert_eq!(storage.len(), 0);
  }

  #[tokio::test]
  async fn test_get_categories_in_server_order() {
    let (client, transport, _) = client(FakeTransport::new().with(
      ROOT,
      json!({
        "people": "https://swapi.dev/api/people/",
        "planets": "https://swapi.dev/api/planets/",
        "films": "https://swapi.dev/api/films/",
      }),
    ));

    let categories = client.get_categories().await.unwrap();
    assert_eq!(categories.names(), vec!["people", "planets", "films"]);
    assert_eq!(transport.requested(), vec![ROOT.to_string()]);
  }

  #[test]
  fn test_resources_url() {
    let (client, _, _) = client(FakeTransport::new());
    assert_eq!(
      client.resources_url("people", 2, ""),
      "https://swapi.dev/api/people/?page=2"
    );
    assert_eq!(
      client.resources_url("people", 1, "sky"),
      "https://swapi.dev/api/people/?page=1&search=sky"
    );
    assert_eq!(
      client.resources_url("starships", 1, "death star"),
      "https://swapi.dev/api/starships/?page=1&search=death+star"
    );
  }

  #[test]
  fn test_details_url() {
    let (client, _, _) = client(FakeTransport::new());
    assert_eq!(
      client.details_url("planets", "3"),
      "https://swapi.dev/api/planets/3"
    );
  }

  #[tokio::test]
  async fn test_pages_and_searches_are_cached_separately() {
    let page1 = "https://swapi.dev/api/people/?page=1";
    let page2 = "https://swapi.dev/api/people/?page=2";
    let search = "https://swapi.dev/api/people/?page=1&search=luke";
    let (client, transport, storage) = client(
      FakeTransport::new()
        .with(page1, json!({"count": 82, "results": [{"name": "Luke"}]}))
        .with(page2, json!({"count": 82, "results": [{"name": "Jek"}]}))
        .with(search, json!({"count": 1, "results": [{"name": "Luke"}]})),
    );

    let first = client.get_resources("people", 1, "").await.unwrap();
    let second = client.get_resources("people", 2, "").await.unwrap();
    let found = client.get_resources("people", 1, "luke").await.unwrap();
    client.get_resources("people", 1, "").await.unwrap();

    assert_eq!(first.count, 82);
    assert_eq!(second.results[0].label(), Some("Jek"));
    assert_eq!(found.count, 1);
    assert_eq!(transport.calls(), 3);
    assert_eq!(storage.len(), 3);
  }

  #[tokio::test]
  async fn test_page_past_the_end_is_passed_through() {
    let url = "https://swapi.dev/api/people/?page=99";
    let (client, _, _) = client(FakeTransport::new().with(url, json!({"count": 82, "results": []})));

    let page = client.get_resources("people", 99, "").await.unwrap();
    assert_eq!(page.count, 82);
    assert!(page.results.is_empty());
  }

  #[tokio::test]
  async fn test_get_resource_details_leaves_references() {
    let url = "https://swapi.dev/api/people/1";
    let (client, _, _) = client(FakeTransport::new().with(
      url,
      json!({"name": "Luke", "homeworld": "https://swapi.dev/api/planets/1/"}),
    ));

    let entity = client.get_resource_details("people", "1").await.unwrap();
    assert_eq!(
      entity.get("homeworld"),
      Some(&json!("https://swapi.dev/api/planets/1/"))
    );
  }

  #[tokio::test]
  async fn test_non_object_entity_is_wrapped() {
    let url = "https://swapi.dev/api/people/1";
    let (client, _, _) = client(FakeTransport::new().with(url, json!([1, 2, 3])));

    let entity = client.get_resource_details("people", "1").await.unwrap();
    assert_eq!(entity.get("value"), Some(&json!([1, 2, 3])));
  }

  #[tokio::test]
  async fn test_search_key_uses_encoded_url() {
    let url = "https://swapi.dev/api/starships/?page=1&search=death+star";
    let (client, transport, storage) = client(
      FakeTransport::new().with(url, json!({"count": 1, "results": [{"name": "Death Star"}]})),
    );

    client.get_resources("starships", 1, "death star").await.unwrap();
    assert_eq!(transport.requested(), vec![url.to_string()]);
    assert!(storage.get(&format!("swCache.{}", url)).unwrap().is_some());
  }
}
