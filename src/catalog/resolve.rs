//! One-level reference resolution.
//!
//! Every field of an entity that holds a URL or a list of URLs is replaced by
//! the fetched entities, tagged with the category inferred from the URL.
//! Fetched entities are not resolved further.

use color_eyre::{eyre::Report, Result};
use futures::future::try_join_all;
use futures::{stream, StreamExt, TryStreamExt};
use serde_json::Value;
use tracing::debug;

use super::client::CatalogClient;
use super::types::{Entity, FieldValue, ResolvedEntity, ResolvedField, ResolvedReference};
use super::url::extract_resource_type_from_url;

/// Resolve every reference field of `entity` concurrently.
///
/// Fails as a whole if any single fetch fails. Entities fetched before the
/// failure stay in the cache.
pub async fn populate_all(client: &CatalogClient, entity: &Entity) -> Result<ResolvedEntity> {
  let resolutions = entity.fields().map(|(name, value)| async move {
    let field = populate_single(client, name, value).await?;
    Ok::<_, Report>((name.clone(), field))
  });

  let fields = try_join_all(resolutions).await?;
  debug!(fields = fields.len(), "entity populated");

  Ok(ResolvedEntity { fields })
}

/// Resolve one field. Non-reference values are returned unchanged.
pub async fn populate_single(
  client: &CatalogClient,
  name: &str,
  value: &Value,
) -> Result<ResolvedField> {
  match FieldValue::classify(name, value) {
    FieldValue::ReferenceList(urls) => {
      let tag = urls
        .first()
        .and_then(|url| extract_resource_type_from_url(url))
        .map(String::from);
      let entities = fetch_all(client, &urls).await?;
      Ok(ResolvedField::Reference(ResolvedReference { tag, entities }))
    }
    FieldValue::SingleReference(url) => {
      let tag = extract_resource_type_from_url(&url).map(String::from);
      let entity = client.request_entity(&url).await?;
      Ok(ResolvedField::Reference(ResolvedReference {
        tag,
        entities: vec![entity],
      }))
    }
    FieldValue::Scalar(value) => Ok(ResolvedField::Value(value)),
  }
}

/// Fetch `urls` concurrently, keeping input order. Duplicates are fetched
/// once per occurrence.
async fn fetch_all(client: &CatalogClient, urls: &[String]) -> Result<Vec<Entity>> {
  let limit = client.max_concurrency().unwrap_or(urls.len()).max(1);

  let requests: Vec<_> = urls.iter().map(|url| client.request_entity(url)).collect();
  stream::iter(requests)
    .buffered(limit)
    .try_collect()
    .await
}
